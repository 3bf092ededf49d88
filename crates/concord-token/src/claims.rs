//! Actor token claim sets.
//!
//! [`ActorClaims`] is what the issuer signs. Inbound tokens are first decoded
//! into [`UncheckedClaims`], where every field is optional and untyped, and
//! turned into [`VerifiedClaims`] exactly once by [`UncheckedClaims::check`]
//! after the signature has been verified.

use crate::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use concord_types::{NodeAddress, TokenKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims carried by an actor token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Actor identifier.
    pub sub: String,
    /// Home node address of the actor: `domain/node`.
    pub iss: String,
    /// Node address the token is presented to: `domain/node`.
    pub aud: String,
    /// Token kind tag; always `"actor"` for tokens minted here.
    #[serde(rename = "type")]
    pub token_type: String,
    /// Issue time, unix seconds.
    pub iat: i64,
}

/// Claims as found in a token, before any of them is trusted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UncheckedClaims {
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub iss: Option<Value>,
    #[serde(default)]
    pub aud: Option<Value>,
    #[serde(rename = "type", default)]
    pub token_type: Option<Value>,
}

/// Claims that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub issuer: NodeAddress,
    pub audience: NodeAddress,
}

impl UncheckedClaims {
    /// Reads the claims out of a compact JWS payload without verifying it.
    ///
    /// Only used to route key resolution; nothing read here is trusted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] if the token is not three
    /// dot-separated segments or the payload is not a base64url JSON object.
    pub fn peek(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::MalformedToken(format!("payload encoding: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("payload: {e}")))
    }

    /// Parses the issuer claim into a node address.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedIssuer`] if the claim is absent, not a
    /// string, or not exactly two non-empty `/`-separated components.
    pub fn issuer(&self) -> Result<NodeAddress, AuthError> {
        let issuer = self
            .iss
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::MalformedIssuer("missing or not a string".to_string()))?;
        NodeAddress::parse(issuer)
            .map_err(|e| AuthError::MalformedIssuer(format!("{issuer:?}: {e}")))
    }

    /// Parses the audience claim into a node address.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedAudience`] under the same rules as
    /// [`UncheckedClaims::issuer`].
    pub fn audience(&self) -> Result<NodeAddress, AuthError> {
        let audience = self
            .aud
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::MalformedAudience("missing or not a string".to_string()))?;
        NodeAddress::parse(audience)
            .map_err(|e| AuthError::MalformedAudience(format!("{audience:?}: {e}")))
    }

    /// Validates every claim of a signature-verified token.
    ///
    /// Checks run in order: subject, type, issuer, audience.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ClaimMissingOrWrongType`] for an absent, non-string or
    ///   empty `sub`.
    /// - [`AuthError::WrongTokenType`] unless `type` is the actor tag.
    /// - [`AuthError::MalformedIssuer`] / [`AuthError::MalformedAudience`].
    pub fn check(&self) -> Result<VerifiedClaims, AuthError> {
        let subject = match self.sub.as_ref().and_then(Value::as_str) {
            Some(sub) if !sub.is_empty() => sub.to_string(),
            _ => return Err(AuthError::ClaimMissingOrWrongType("sub")),
        };

        let tag = self.token_type.as_ref().and_then(Value::as_str);
        match tag.and_then(TokenKind::from_label) {
            Some(TokenKind::Actor) => {}
            _ => {
                return Err(AuthError::WrongTokenType(
                    tag.unwrap_or("<missing>").to_string(),
                ))
            }
        }

        Ok(VerifiedClaims {
            subject,
            issuer: self.issuer()?,
            audience: self.audience()?,
        })
    }
}
