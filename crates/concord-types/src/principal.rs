use crate::NodeAddress;
use serde::{Deserialize, Serialize};

/// An actor authenticated from a verified token.
///
/// Derived per request and never stored. `is_local` is true only when the
/// token was issued by the same node (in the same domain) it is addressed to;
/// handlers use it to refuse cross-node self-service operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
    /// Actor identifier (the `sub` claim).
    pub identifier: String,
    /// Full actor address: `domain/node/actor`.
    pub address: String,
    pub source_domain: String,
    pub source_node_identifier: String,
    pub source_node_address: String,
    pub target_domain: String,
    pub target_node_identifier: String,
    pub target_node_address: String,
    pub is_local: bool,
}

impl AuthenticatedPrincipal {
    /// Builds a principal from the verified subject, issuer and audience.
    pub fn new(identifier: impl Into<String>, source: &NodeAddress, target: &NodeAddress) -> Self {
        let identifier = identifier.into();
        Self {
            address: source.actor_address(&identifier),
            identifier,
            source_domain: source.domain.clone(),
            source_node_identifier: source.node.clone(),
            source_node_address: source.to_string(),
            target_domain: target.domain.clone(),
            target_node_identifier: target.node.clone(),
            target_node_address: target.to_string(),
            is_local: source.same_origin(target),
        }
    }

    /// Issuer node address.
    pub fn source(&self) -> NodeAddress {
        NodeAddress::new(&self.source_domain, &self.source_node_identifier)
    }

    /// Audience node address.
    pub fn target(&self) -> NodeAddress {
        NodeAddress::new(&self.target_domain, &self.target_node_identifier)
    }
}
