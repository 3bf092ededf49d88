//! Error types for token issuance and validation.

use thiserror::Error;

/// Reasons a credential is rejected.
///
/// Every variant is terminal for the current request and nothing is retried.
/// The HTTP layer collapses all of them into a single "unauthorized" outcome;
/// the detail is for logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization credential was presented.
    #[error("authorization credential is missing")]
    CredentialMissing,

    /// The credential used a scheme other than `Bearer`.
    #[error("unsupported authorization scheme: {0}")]
    UnsupportedTokenType(String),

    /// The credential or token envelope could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The `iss` claim is not a `domain/node` address.
    #[error("malformed token issuer: {0}")]
    MalformedIssuer(String),

    /// The `aud` claim is not a `domain/node` address.
    #[error("malformed token audience: {0}")]
    MalformedAudience(String),

    /// The issuer claims this server's domain but names no local node.
    #[error("unknown token issuer: {0}")]
    UnknownIssuer(String),

    /// The issuer's domain could not provide a usable public key.
    #[error("federation lookup failed: {0}")]
    FederationLookupFailed(String),

    /// The signature does not verify with EdDSA against the issuer's key.
    #[error("invalid token signature: {0}")]
    SignatureInvalid(String),

    /// The `type` claim is absent or is not the actor tag.
    #[error("wrong token type: {0}")]
    WrongTokenType(String),

    /// A required claim is absent or has the wrong JSON type.
    #[error("claim `{0}` is missing or has the wrong type")]
    ClaimMissingOrWrongType(&'static str),
}

/// Errors produced while minting a token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IssueError {
    /// The node's private key could not be decoded or signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}
