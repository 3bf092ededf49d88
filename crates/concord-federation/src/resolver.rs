//! Remote node resolution over HTTP.

use crate::FederationError;
use concord_identity::PublishedNode;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default lookup scheme. Plain `http` is only meant for local development.
pub const DEFAULT_SCHEME: &str = "https";

/// Per-request timeout for federation lookups.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the published identity of a node in a foreign domain.
pub trait RemoteResolver: Send + Sync {
    /// Fetches the identity of `node` as published by `domain`.
    ///
    /// Dropping the returned future cancels the outbound request.
    fn resolve_remote(
        &self,
        domain: &str,
        node: &str,
    ) -> impl Future<Output = Result<PublishedNode, FederationError>> + Send;
}

impl<T: RemoteResolver> RemoteResolver for Arc<T> {
    fn resolve_remote(
        &self,
        domain: &str,
        node: &str,
    ) -> impl Future<Output = Result<PublishedNode, FederationError>> + Send {
        (**self).resolve_remote(domain, node)
    }
}

/// Resolver that queries `<scheme>://<domain>/api/v1/nodes/<node>`.
///
/// Each lookup is an independent request bounded by the client timeout; there
/// is no retry.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    scheme: String,
}

impl HttpResolver {
    /// Creates an `https` resolver with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Transport`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FederationError> {
        Self::with_scheme(DEFAULT_SCHEME, timeout)
    }

    /// Creates a resolver using `scheme` (`https` or `http`).
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::InvalidScheme`] for any other scheme.
    pub fn with_scheme(scheme: &str, timeout: Duration) -> Result<Self, FederationError> {
        if scheme != "https" && scheme != "http" {
            return Err(FederationError::InvalidScheme(scheme.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("concord/", env!("CARGO_PKG_VERSION"), " (federation)"))
            .build()?;

        Ok(Self {
            client,
            scheme: scheme.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Builds the well-known lookup URL for a node.
    ///
    /// `domain` must be a bare authority (`host` or `host:port`): credentials,
    /// paths, queries and fragments are refused so an issuer claim cannot
    /// redirect the lookup. `node` is percent-encoded as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::InvalidDomain`] or
    /// [`FederationError::InvalidNode`].
    pub fn lookup_url(&self, domain: &str, node: &str) -> Result<Url, FederationError> {
        let invalid_domain = || FederationError::InvalidDomain(domain.to_string());

        if domain.is_empty() {
            return Err(invalid_domain());
        }
        if node.is_empty() || node == "." || node == ".." {
            return Err(FederationError::InvalidNode(node.to_string()));
        }

        let mut url =
            Url::parse(&format!("{}://{}", self.scheme, domain)).map_err(|_| invalid_domain())?;
        let bare_authority = url.host_str().is_some_and(|host| !host.is_empty())
            && url.username().is_empty()
            && url.password().is_none()
            && url.path() == "/"
            && url.query().is_none()
            && url.fragment().is_none();
        if !bare_authority {
            return Err(invalid_domain());
        }

        url.path_segments_mut()
            .map_err(|_| invalid_domain())?
            .pop_if_empty()
            .extend(["api", "v1", "nodes", node]);

        Ok(url)
    }
}

impl RemoteResolver for HttpResolver {
    async fn resolve_remote(
        &self,
        domain: &str,
        node: &str,
    ) -> Result<PublishedNode, FederationError> {
        let url = self.lookup_url(domain, node)?;
        tracing::debug!(%url, "resolving remote node");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FederationError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let published: PublishedNode =
            serde_json::from_slice(&body).map_err(|e| FederationError::Body(e.to_string()))?;
        published
            .verifying_key()
            .map_err(|e| FederationError::Body(e.to_string()))?;

        Ok(published)
    }
}
