//! Federation layer for the Concord platform.
//!
//! Resolves the published identity of a node that lives in a *foreign*
//! domain by asking that domain directly:
//! `GET https://<domain>/api/v1/nodes/<node>`.
//!
//! There is no central registry and no implicit trust. Every lookup failure
//! (transport, timeout, non-success status, malformed body) is an error the
//! caller must treat as a verification failure. Lookups are not cached or
//! retried unless the caller opts into [`CachedResolver`].

pub mod cache;
pub mod resolver;

pub use cache::{CachedResolver, DEFAULT_MAX_ENTRIES};
pub use concord_identity::PublishedNode;
pub use resolver::{HttpResolver, RemoteResolver, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_SCHEME};

use thiserror::Error;

/// Errors that can occur while resolving a remote node.
#[derive(Debug, Error)]
pub enum FederationError {
    /// The domain is not a bare `host[:port]` authority.
    #[error("invalid federation domain: {0:?}")]
    InvalidDomain(String),
    /// The node identifier cannot be used as a path segment.
    #[error("invalid node identifier: {0:?}")]
    InvalidNode(String),
    /// The lookup scheme is neither `https` nor `http`.
    #[error("unsupported lookup scheme: {0:?}")]
    InvalidScheme(String),
    /// The request failed to complete (connect, TLS, timeout, read).
    #[error("federation transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The remote domain answered with a non-success status.
    #[error("remote domain returned status {0}")]
    Status(u16),
    /// The response body was not a usable published identity.
    #[error("malformed remote identity: {0}")]
    Body(String),
}
