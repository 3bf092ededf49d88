//! Concord server library logic.

pub mod api;
pub mod config;
pub mod middleware;

use axum::{routing::get, Extension, Router};
use concord_federation::{CachedResolver, HttpResolver};
use concord_identity::{IdentityError, MemoryRegistry, NodeRegistry};
use concord_token::{ActorTokenValidator, IssueError, TokenIssuer};
use config::{Config, ConfigError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Errors from minting a token for a local node.
#[derive(Debug, thiserror::Error)]
pub enum MintError {
    /// The node is not hosted here.
    #[error(transparent)]
    Node(#[from] IdentityError),

    /// The token could not be signed.
    #[error(transparent)]
    Issue(#[from] IssueError),
}

/// Federation resolver used by the server; caching is off unless configured.
pub type ServerResolver = CachedResolver<HttpResolver>;

/// Actor token validator used by the server.
pub type ServerValidator = ActorTokenValidator<Arc<MemoryRegistry>, ServerResolver>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Federation domain this server answers for.
    pub domain: String,
    /// Nodes hosted by this domain.
    pub registry: Arc<MemoryRegistry>,
    /// Mints tokens for actors of the local nodes.
    pub issuer: TokenIssuer,
    /// Validates actor tokens from any domain.
    pub validator: Arc<ServerValidator>,
    /// Deadline for authenticating and handling a protected request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Builds the shared state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the domain is empty, a timeout or cache TTL
    /// is zero, a configured node has unusable keys or a duplicate
    /// identifier, or the federation client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let domain = config.server.domain.trim();
        if domain.is_empty() || domain.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "server.domain {:?} must be a non-empty name without '/'",
                config.server.domain
            )));
        }

        let registry = Arc::new(MemoryRegistry::from_nodes(config.nodes.iter().cloned())?);
        let resolver = CachedResolver::new(
            HttpResolver::with_scheme(&config.federation.scheme, config.federation.timeout())?,
            config.federation.cache_ttl(),
        );
        if resolver.inner().scheme() != "https" {
            tracing::warn!(
                scheme = resolver.inner().scheme(),
                "federation lookups are not using https"
            );
        }

        Ok(Self {
            domain: domain.to_string(),
            issuer: TokenIssuer::new(domain),
            validator: Arc::new(ActorTokenValidator::new(domain, registry.clone(), resolver)),
            registry,
            request_timeout: config.server.request_timeout(),
        })
    }

    /// Mints a token for `actor` of the hosted node `node`.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::Node`] if `node` is not hosted here and
    /// [`MintError::Issue`] if signing fails.
    pub fn mint_token(
        &self,
        node: &str,
        actor: &str,
        target: Option<&str>,
    ) -> Result<String, MintError> {
        let node = self.registry.resolve(node)?;
        Ok(self.issuer.issue(actor, &node, target)?)
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/actors/current", get(api::current_actor_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(api::health))
        .route("/api/v1/nodes", get(api::list_nodes_handler))
        .route("/api/v1/nodes/{identifier}", get(api::get_node_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
