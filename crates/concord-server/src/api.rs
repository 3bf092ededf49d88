//! API handlers for the Concord server.

use crate::middleware::PrincipalContext;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use concord_identity::{IdentityError, NodeRegistry, PublishedNode};
use concord_types::AuthenticatedPrincipal;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request timed out")]
    Timeout,
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NodeNotFound(identifier) => {
                ApiError::NotFound(format!("node {identifier}"))
            }
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

/// Health check handler.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handler for `GET /api/v1/nodes`.
pub async fn list_nodes_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<PublishedNode>>, ApiError> {
    let nodes = state.registry.list()?;
    Ok(Json(nodes.iter().map(|node| node.published()).collect()))
}

/// Handler for `GET /api/v1/nodes/{identifier}`.
///
/// This is the endpoint foreign domains query to verify tokens minted here.
pub async fn get_node_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<PublishedNode>, ApiError> {
    let node = state.registry.resolve(&identifier)?;
    Ok(Json(node.published()))
}

/// Handler for `GET /api/v1/actors/current`.
///
/// Only actors presenting a token addressed to their own home node may use
/// self-service endpoints.
pub async fn current_actor_handler(
    Extension(PrincipalContext(principal)): Extension<PrincipalContext>,
) -> Result<Json<AuthenticatedPrincipal>, ApiError> {
    if !principal.is_local {
        return Err(ApiError::Forbidden("not allowed".to_string()));
    }
    Ok(Json(principal))
}
