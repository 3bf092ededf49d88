//! Identity Registry.
//!
//! Resolves node identifiers of the local domain to their stored identities.
//! Resolution performs no network I/O: it is used both to mint tokens (the
//! issuer needs its own private key) and to verify tokens whose issuer domain
//! is this server's own domain.

use crate::{IdentityError, NodeIdentity};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Lookup of local node identities by identifier.
pub trait NodeRegistry: Send + Sync {
    /// Resolves a node of the local domain.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NodeNotFound`] if no such node exists, or
    /// [`IdentityError::Storage`] if the backing store fails.
    fn resolve(&self, identifier: &str) -> Result<NodeIdentity, IdentityError>;
}

impl<T: NodeRegistry + ?Sized> NodeRegistry for Arc<T> {
    fn resolve(&self, identifier: &str) -> Result<NodeIdentity, IdentityError> {
        (**self).resolve(identifier)
    }
}

/// In-memory registry of local nodes.
///
/// Lock acquisitions are brief map operations that never span `.await`
/// points, so a synchronous `RwLock` is used.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    nodes: RwLock<HashMap<String, NodeIdentity>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a set of nodes, rejecting duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NodeExists`] if two nodes share an identifier
    /// and [`IdentityError::MalformedKey`] if a node's keys are unusable.
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = NodeIdentity>,
    ) -> Result<Self, IdentityError> {
        let registry = Self::new();
        for node in nodes {
            registry.insert(node)?;
        }
        Ok(registry)
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NodeExists`] if the identifier is taken and
    /// [`IdentityError::MalformedKey`] if the node's keys do not decode or do
    /// not belong together.
    pub fn insert(&self, node: NodeIdentity) -> Result<(), IdentityError> {
        node.validate()?;

        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| IdentityError::Storage("node registry lock poisoned".to_string()))?;
        if nodes.contains_key(&node.identifier) {
            return Err(IdentityError::NodeExists(node.identifier));
        }
        tracing::debug!(node = %node.identifier, "registered local node");
        nodes.insert(node.identifier.clone(), node);
        Ok(())
    }

    /// All registered nodes, ordered by identifier.
    pub fn list(&self) -> Result<Vec<NodeIdentity>, IdentityError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| IdentityError::Storage("node registry lock poisoned".to_string()))?;
        let mut list: Vec<NodeIdentity> = nodes.values().cloned().collect();
        list.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().map(|nodes| nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeRegistry for MemoryRegistry {
    fn resolve(&self, identifier: &str) -> Result<NodeIdentity, IdentityError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| IdentityError::Storage("node registry lock poisoned".to_string()))?;
        nodes
            .get(identifier)
            .cloned()
            .ok_or_else(|| IdentityError::NodeNotFound(identifier.to_string()))
    }
}
