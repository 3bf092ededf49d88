//! Federated actor token validation.
//!
//! Validation is an explicit two-phase protocol. The issuer claim is read
//! from the unverified payload only to decide where the public key comes from
//! (the local registry for this server's domain, a federation lookup for any
//! other). The signature is then verified with that key and every claim is
//! checked again from the verified payload.

use crate::claims::UncheckedClaims;
use crate::credential::{Credential, CredentialValidator};
use crate::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use concord_federation::RemoteResolver;
use concord_identity::NodeRegistry;
use concord_types::{AuthenticatedPrincipal, NodeAddress};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

/// Validates actor tokens presented to a server of `domain`.
pub struct ActorTokenValidator<R, F> {
    domain: String,
    registry: R,
    resolver: F,
    validation: Validation,
}

impl<R, F> ActorTokenValidator<R, F>
where
    R: NodeRegistry,
    F: RemoteResolver,
{
    pub fn new(domain: impl Into<String>, registry: R, resolver: F) -> Self {
        // Only the signature and algorithm are checked by jsonwebtoken. Claims
        // are checked by `UncheckedClaims::check`, and tokens carry no expiry.
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            domain: domain.into(),
            registry,
            resolver,
            validation,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn resolver(&self) -> &F {
        &self.resolver
    }

    /// Validates a bare compact token.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failing step.
    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::MalformedToken(format!("header: {e}")))?;
        if header.alg != Algorithm::EdDSA {
            return Err(AuthError::SignatureInvalid(format!(
                "algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let issuer = UncheckedClaims::peek(token)?.issuer()?;
        let key = self.resolve_issuer_key(&issuer).await?;

        let verified = jsonwebtoken::decode::<UncheckedClaims>(token, &key, &self.validation)
            .map_err(map_decode_error)?;
        let claims = verified.claims.check()?;

        // Both issuer reads come from the same signed bytes.
        if claims.issuer != issuer {
            return Err(AuthError::MalformedIssuer(format!(
                "issuer changed from {issuer} to {}",
                claims.issuer
            )));
        }

        Ok(AuthenticatedPrincipal::new(
            claims.subject,
            &claims.issuer,
            &claims.audience,
        ))
    }

    async fn resolve_issuer_key(&self, issuer: &NodeAddress) -> Result<DecodingKey, AuthError> {
        let verifying_key = if issuer.domain == self.domain {
            tracing::debug!(node = %issuer.node, "resolving issuer from local registry");
            self.registry
                .resolve(&issuer.node)
                .and_then(|node| node.verifying_key())
                .map_err(|e| AuthError::UnknownIssuer(format!("{issuer}: {e}")))?
        } else {
            tracing::debug!(
                domain = %issuer.domain,
                node = %issuer.node,
                "resolving issuer via federation"
            );
            let published = self
                .resolver
                .resolve_remote(&issuer.domain, &issuer.node)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        domain = %issuer.domain,
                        node = %issuer.node,
                        error = %e,
                        "federation lookup failed"
                    );
                    AuthError::FederationLookupFailed(format!("{issuer}: {e}"))
                })?;
            published
                .verifying_key()
                .map_err(|e| AuthError::FederationLookupFailed(format!("{issuer}: {e}")))?
        };

        DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(verifying_key.as_bytes()))
            .map_err(|e| AuthError::SignatureInvalid(format!("issuer key: {e}")))
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::Base64(_)
        | ErrorKind::Crypto(_) => AuthError::SignatureInvalid(err.to_string()),
        // The payload already parsed as an object, so this is a registered
        // claim with a type jsonwebtoken refuses.
        ErrorKind::Json(_) | ErrorKind::Utf8(_) => AuthError::ClaimMissingOrWrongType("claims"),
        _ => AuthError::MalformedToken(err.to_string()),
    }
}

impl<R, F> CredentialValidator for ActorTokenValidator<R, F>
where
    R: NodeRegistry,
    F: RemoteResolver,
{
    type Principal = AuthenticatedPrincipal;

    async fn validate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let result = match Credential::parse(authorization).and_then(Credential::bearer) {
            Ok(token) => self.validate_token(token).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(error = %e, "actor credential rejected");
        }
        result
    }
}
