//! Actor tokens for the Concord federation.
//!
//! A node mints EdDSA-signed tokens for the actors it hosts
//! ([`TokenIssuer`]). Any server, in any domain, can validate them
//! ([`ActorTokenValidator`]) by resolving the issuing node's public key from
//! its own registry or, for foreign domains, from the issuer's domain itself.

pub mod claims;
pub mod credential;
pub mod error;
pub mod issuer;
pub mod validator;

pub use claims::{ActorClaims, UncheckedClaims, VerifiedClaims};
pub use credential::{Credential, CredentialValidator};
pub use error::{AuthError, IssueError};
pub use issuer::{sign, TokenIssuer};
pub use validator::ActorTokenValidator;
