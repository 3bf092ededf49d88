//! Authorization credential extraction.
//!
//! A credential is `<Scheme> <Token>`. Every token kind shares this step; only
//! the `Bearer` scheme is recognized.

use crate::AuthError;
use concord_types::BEARER_SCHEME;
use std::future::Future;

/// A parsed `Authorization` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential<'a> {
    pub scheme: &'a str,
    pub token: &'a str,
}

impl<'a> Credential<'a> {
    /// Splits an authorization value into scheme and token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialMissing`] for an absent or blank value
    /// and [`AuthError::MalformedToken`] unless it is exactly two
    /// space-separated parts.
    pub fn parse(authorization: Option<&'a str>) -> Result<Self, AuthError> {
        let value = authorization
            .filter(|value| !value.trim().is_empty())
            .ok_or(AuthError::CredentialMissing)?;

        let mut parts = value.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if !scheme.is_empty() && !token.is_empty() => {
                Ok(Self { scheme, token })
            }
            _ => Err(AuthError::MalformedToken(
                "invalid authorization header".to_string(),
            )),
        }
    }

    /// Returns the token of a `Bearer` credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedTokenType`] for any other scheme.
    pub fn bearer(self) -> Result<&'a str, AuthError> {
        if self.scheme == BEARER_SCHEME {
            Ok(self.token)
        } else {
            Err(AuthError::UnsupportedTokenType(self.scheme.to_string()))
        }
    }
}

/// Capability shared by every token kind's validator.
///
/// Implementations take the raw `Authorization` value and produce their own
/// principal type or reject the credential.
pub trait CredentialValidator: Send + Sync {
    type Principal: Send;

    fn validate(
        &self,
        authorization: Option<&str>,
    ) -> impl Future<Output = Result<Self::Principal, AuthError>> + Send;
}
