//! Node identity records.

use crate::keys::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key, generate_keypair,
};
use crate::IdentityError;
use concord_types::NodeAddress;
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node's stored identity, including its private signing key.
///
/// The keypair is created once at provisioning and never rotated. The private
/// key is never serialized; use [`NodeIdentity::published`] for anything that
/// leaves the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
    /// Base64 `seed || public` Ed25519 keypair.
    #[serde(skip_serializing)]
    pub signing_private_key: String,
    /// Base64 Ed25519 public key.
    pub signing_public_key: String,
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("identifier", &self.identifier)
            .field("display_name", &self.display_name)
            .field("signing_private_key", &"[REDACTED]")
            .field("signing_public_key", &self.signing_public_key)
            .finish()
    }
}

impl NodeIdentity {
    /// Provisions a new node with a freshly generated signing keypair.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Entropy`] if key generation fails.
    pub fn provision(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let (public, private) = generate_keypair()?;
        Ok(Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            signing_private_key: encode_private_key(&private),
            signing_public_key: encode_public_key(&public),
        })
    }

    /// Address of this node inside `domain`.
    pub fn address(&self, domain: &str) -> NodeAddress {
        NodeAddress::new(domain, &self.identifier)
    }

    pub fn signing_key(&self) -> Result<SigningKey, IdentityError> {
        decode_private_key(&self.signing_private_key)
    }

    pub fn verifying_key(&self) -> Result<VerifyingKey, IdentityError> {
        decode_public_key(&self.signing_public_key)
    }

    /// Checks that both stored keys decode and belong together.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedKey`] if either key fails to decode or
    /// the public key is not the one derived from the private key.
    pub fn validate(&self) -> Result<(), IdentityError> {
        let signing_key = self.signing_key()?;
        if signing_key.verifying_key() != self.verifying_key()? {
            return Err(IdentityError::MalformedKey(format!(
                "public key of node {} does not match its private key",
                self.identifier
            )));
        }
        Ok(())
    }

    /// The public part of this identity, as served to federation peers.
    pub fn published(&self) -> PublishedNode {
        PublishedNode {
            identifier: self.identifier.clone(),
            display_name: self.display_name.clone(),
            signing_public_key: self.signing_public_key.clone(),
        }
    }
}

/// Public identity of a node as published at `/api/v1/nodes/{identifier}`.
///
/// Unknown fields in a peer's response are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedNode {
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
    pub signing_public_key: String,
}

impl PublishedNode {
    pub fn verifying_key(&self) -> Result<VerifyingKey, IdentityError> {
        decode_public_key(&self.signing_public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioned_node_has_matching_keys() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        node.validate().unwrap();
        assert_eq!(
            node.signing_key().unwrap().verifying_key(),
            node.verifying_key().unwrap()
        );
    }

    #[test]
    fn validate_rejects_foreign_public_key() {
        let mut node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let other = NodeIdentity::provision("beta", "Beta").unwrap();
        node.signing_public_key = other.signing_public_key;
        assert!(matches!(
            node.validate(),
            Err(IdentityError::MalformedKey(_))
        ));
    }

    #[test]
    fn address_joins_domain_and_identifier() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        assert_eq!(node.address("example.org").to_string(), "example.org/alpha");
    }

    #[test]
    fn serialization_omits_private_key() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("signing_private_key").is_none());
        assert_eq!(json["signing_public_key"], node.signing_public_key.as_str());
    }

    #[test]
    fn debug_redacts_private_key() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let debug = format!("{node:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&node.signing_private_key));
    }

    #[test]
    fn published_node_ignores_unknown_fields() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let body = serde_json::json!({
            "identifier": "alpha",
            "signing_public_key": node.signing_public_key,
            "creator": "root",
            "created_at": 1700000000,
        });
        let published: PublishedNode = serde_json::from_value(body).unwrap();
        assert_eq!(published.display_name, "");
        assert_eq!(
            published.verifying_key().unwrap(),
            node.verifying_key().unwrap()
        );
    }
}
