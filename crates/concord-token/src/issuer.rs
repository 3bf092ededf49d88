//! Actor token issuance.

use crate::claims::ActorClaims;
use crate::IssueError;
use concord_identity::NodeIdentity;
use concord_types::TokenKind;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Mints actor tokens on behalf of the nodes of one domain.
///
/// Issuance is stateless: no nonce, counter or record of minted tokens is kept.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    domain: String,
}

impl TokenIssuer {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Issues a token for `actor` hosted on `source`.
    ///
    /// The audience is `target` if one is given and non-empty, otherwise the
    /// source node's own address.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::Signing`] if the node's private key does not
    /// decode or signing fails.
    pub fn issue(
        &self,
        actor: &str,
        source: &NodeIdentity,
        target: Option<&str>,
    ) -> Result<String, IssueError> {
        let issuer = source.address(&self.domain).to_string();
        let audience = match target {
            Some(target) if !target.is_empty() => target.to_string(),
            _ => issuer.clone(),
        };

        let claims = ActorClaims {
            sub: actor.to_string(),
            iss: issuer,
            aud: audience,
            token_type: TokenKind::Actor.label().to_string(),
            iat: chrono::Utc::now().timestamp(),
        };

        let signing_key = source
            .signing_key()
            .map_err(|e| IssueError::Signing(e.to_string()))?;
        let token = sign(&claims, &signing_key)?;

        tracing::debug!(node = %source.identifier, aud = %claims.aud, "issued actor token");
        Ok(token)
    }
}

/// Signs an arbitrary claim set as an EdDSA compact JWS.
///
/// # Errors
///
/// Returns [`IssueError::Signing`] if the key cannot be exported or the
/// claims cannot be serialized.
pub fn sign<T: Serialize>(claims: &T, signing_key: &SigningKey) -> Result<String, IssueError> {
    let der = signing_key
        .to_pkcs8_der()
        .map_err(|e| IssueError::Signing(format!("key export: {e}")))?;
    let key = EncodingKey::from_ed_der(der.as_bytes());

    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key)
        .map_err(|e| IssueError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::UncheckedClaims;
    use concord_types::NodeAddress;

    #[test]
    fn empty_target_defaults_to_own_address() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let issuer = TokenIssuer::new("d1");

        for target in [None, Some("")] {
            let token = issuer.issue("alice", &node, target).unwrap();
            let claims = UncheckedClaims::peek(&token).unwrap();
            assert_eq!(claims.audience().unwrap(), NodeAddress::new("d1", "alpha"));
            assert_eq!(claims.issuer().unwrap(), NodeAddress::new("d1", "alpha"));
        }
    }

    #[test]
    fn explicit_target_becomes_audience() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let token = TokenIssuer::new("d1")
            .issue("alice", &node, Some("d2/beta"))
            .unwrap();
        let claims = UncheckedClaims::peek(&token).unwrap().check().unwrap();
        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.audience, NodeAddress::new("d2", "beta"));
    }

    #[test]
    fn header_declares_eddsa() {
        let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        let token = TokenIssuer::new("d1").issue("alice", &node, None).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::EdDSA);
    }

    #[test]
    fn undecodable_private_key_is_a_signing_error() {
        let mut node = NodeIdentity::provision("alpha", "Alpha").unwrap();
        node.signing_private_key = "not base64".to_string();
        assert!(matches!(
            TokenIssuer::new("d1").issue("alice", &node, None),
            Err(IssueError::Signing(_))
        ));
    }
}
