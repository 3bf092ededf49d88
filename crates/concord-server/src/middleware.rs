use crate::api::ApiError;
use crate::AppState;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use concord_token::CredentialValidator;
use concord_types::AuthenticatedPrincipal;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};

/// Wrapper for `AuthenticatedPrincipal` to be stored in request extensions.
#[derive(Clone, Debug)]
pub struct PrincipalContext(pub AuthenticatedPrincipal);

/// Middleware to authenticate requests via `Authorization: Bearer <actor token>`.
///
/// One deadline of `request_timeout` covers validation (including any
/// federation lookup) and the wrapped handler. Every validation failure is a
/// plain 401; the reason is only logged.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?;
    let deadline = Instant::now() + state.request_timeout;

    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map(str::to_owned))
        .transpose()
        .map_err(|_| ApiError::Unauthorized)?;

    let principal = timeout_at(deadline, state.validator.validate(authorization.as_deref()))
        .await
        .map_err(|_| {
            tracing::warn!("credential validation timed out");
            ApiError::Unauthorized
        })?
        .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(PrincipalContext(principal));

    timeout_at(deadline, next.run(req))
        .await
        .map_err(|_| ApiError::Timeout)
}
