//! Bearer-token authentication middleware
//!
//! Shared by both servers: the controller guards its operator surface and
//! each node agent guards its local API with the same check. Tokens are
//! compared by exact match and never logged.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::Error;

/// Anything that can resolve its expected credential
pub trait TokenGuard: Send + Sync + 'static {
    fn expected_token(&self) -> Option<&str>;
}

/// Extract the bearer token from the Authorization header
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware verifying the request credential before any handler runs.
///
/// A mismatch fails with `Unauthorized` and no side effect. If no token is
/// configured, requests are allowed (development mode) with a warning.
pub async fn require_token<S: TokenGuard>(
    State(state): State<Arc<S>>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    let Some(expected) = state.expected_token() else {
        tracing::warn!("no credential configured - allowing unauthenticated access");
        return Ok(next.run(req).await);
    };

    match bearer_token(&req) {
        Some(token) if token == expected => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("invalid credential presented");
            Err(Error::Unauthorized)
        }
        None => {
            tracing::debug!("no credential presented");
            Err(Error::Unauthorized)
        }
    }
}
