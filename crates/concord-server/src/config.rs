//! Server configuration loading from file and environment variables.

use concord_federation::{FederationError, DEFAULT_SCHEME};
use concord_identity::{IdentityError, NodeIdentity};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Outbound federation lookups.
    #[serde(default)]
    pub federation: FederationConfig,

    /// Nodes hosted by this server's domain.
    #[serde(default)]
    pub nodes: Vec<NodeIdentity>,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Federation domain this server answers for, e.g. `chat.example.org`.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Deadline for authenticating and handling a protected request.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "concord_token=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Federation lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FederationConfig {
    /// `https`, or `http` for local development only.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Per-lookup timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cache successful lookups for this long. Unset means no caching.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_domain() -> String {
    "localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            domain: default_domain(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: None,
        }
    }
}

impl Config {
    /// Rejects values that would make every request or lookup fail.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero request timeout, lookup
    /// timeout or cache TTL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.federation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "federation.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.federation.cache_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "federation.cache_ttl_secs must be greater than zero; omit it to disable caching"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FederationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Errors that can occur when loading configuration or building state from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configured value is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A configured node is unusable.
    #[error("invalid node configuration: {0}")]
    Identity(#[from] IdentityError),

    /// The federation client could not be built.
    #[error("invalid federation configuration: {0}")]
    Federation(#[from] FederationError),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CONCORD_HOST` overrides `server.host`
/// - `CONCORD_PORT` overrides `server.port`
/// - `CONCORD_DOMAIN` overrides `server.domain`
/// - `CONCORD_LOG_LEVEL` overrides `logging.level`
/// - `CONCORD_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `CONCORD_FEDERATION_SCHEME` overrides `federation.scheme`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("CONCORD_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("CONCORD_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(domain) = std::env::var("CONCORD_DOMAIN") {
        if !domain.trim().is_empty() {
            config.server.domain = domain;
        }
    }
    if let Ok(level) = std::env::var("CONCORD_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("CONCORD_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(scheme) = std::env::var("CONCORD_FEDERATION_SCHEME") {
        config.federation.scheme = scheme;
    }

    Ok(config)
}

/// Renders a `[[nodes]]` block for a provisioned node, private key included.
pub fn node_toml(node: &NodeIdentity) -> String {
    let quote = |value: &str| toml::Value::String(value.to_string()).to_string();
    format!(
        "[[nodes]]\nidentifier = {}\ndisplay_name = {}\n\
         signing_public_key = {}\nsigning_private_key = {}\n",
        quote(&node.identifier),
        quote(&node.display_name),
        quote(&node.signing_public_key),
        quote(&node.signing_private_key),
    )
}
