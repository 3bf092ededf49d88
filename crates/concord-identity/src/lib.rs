//! Node identity primitives for the Concord federation.
//!
//! Every node owns exactly one Ed25519 signing keypair for its whole life.
//! This crate generates and encodes that key material, models the stored and
//! published forms of a node identity, and provides the local Identity
//! Registry used by token issuance and validation.

pub mod keys;
pub mod node;
pub mod registry;

pub use keys::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key, generate_keypair,
};
pub use node::{NodeIdentity, PublishedNode};
pub use registry::{MemoryRegistry, NodeRegistry};

use thiserror::Error;

/// Errors produced by identity operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The operating system entropy source failed.
    #[error("entropy source failure: {0}")]
    Entropy(String),
    /// A key string did not decode to a valid key of the expected size.
    #[error("malformed key: {0}")]
    MalformedKey(String),
    /// No node with this identifier exists in the local domain.
    #[error("node {0} not found")]
    NodeNotFound(String),
    /// A node with this identifier already exists.
    #[error("node {0} already exists")]
    NodeExists(String),
    /// The backing store failed.
    #[error("identity storage error: {0}")]
    Storage(String),
}
