//! Shared types, error definitions, and constants for the Concord federation.
//!
//! This crate provides the foundational types used across all Concord crates:
//! hierarchical federation addresses, the token kind tags, and the
//! authenticated principal handed to request handlers.
//!
//! No crate in the workspace depends on anything *except* `concord-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

mod principal;
pub use principal::AuthenticatedPrincipal;

/// The only credential scheme accepted on the authorization channel.
pub const BEARER_SCHEME: &str = "Bearer";

/// Separator between the components of an address.
pub const ADDRESS_SEPARATOR: char = '/';

/// Kinds of token a Concord server can encounter, keyed by the `type` claim.
///
/// The set is closed: a token whose tag is not listed here is rejected before
/// any of its other claims are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// A federated actor token signed by the actor's home node.
    Actor,
    /// A single-domain administrator token.
    Admin,
}

impl TokenKind {
    /// Returns the claim tag for this kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Admin => "admin",
        }
    }

    /// Attempts to convert a claim tag to a `TokenKind`.
    ///
    /// Returns `None` if the tag does not correspond to a known kind.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "actor" => Some(Self::Actor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Errors produced when parsing a federation address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The address did not split into the expected number of components.
    #[error("expected {expected} address components, found {found}")]
    ComponentCount { expected: usize, found: usize },
    /// One of the components was empty.
    #[error("address component {0} is empty")]
    EmptyComponent(usize),
}

/// Address of a node: `domain/node`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    /// Domain (vertex) hosting the node.
    pub domain: String,
    /// Identifier of the node within its domain.
    pub node: String,
}

impl NodeAddress {
    pub fn new(domain: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            node: node.into(),
        }
    }

    /// Parses `domain/node`.
    ///
    /// The input must split on `/` into exactly two non-empty components.
    /// Nothing is returned for partially valid input.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::ComponentCount`] for zero, one, or three or more
    /// components and [`AddressError::EmptyComponent`] when either side is empty.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let components: Vec<&str> = address.split(ADDRESS_SEPARATOR).collect();
        if components.len() != 2 {
            return Err(AddressError::ComponentCount {
                expected: 2,
                found: components.len(),
            });
        }
        if let Some(index) = components.iter().position(|c| c.is_empty()) {
            return Err(AddressError::EmptyComponent(index));
        }

        Ok(Self::new(components[0], components[1]))
    }

    /// Full address of an actor hosted by this node: `domain/node/actor`.
    pub fn actor_address(&self, actor: &str) -> String {
        format!("{self}{ADDRESS_SEPARATOR}{actor}")
    }

    /// Returns `true` if both addresses name the same node in the same domain.
    pub fn same_origin(&self, other: &NodeAddress) -> bool {
        self.node == other.node && self.domain == other.domain
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.domain, ADDRESS_SEPARATOR, self.node)
    }
}

impl std::str::FromStr for NodeAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
