//! Access guard: bearer-token middleware for every `/api` route.
//!
//! The raw token from the `Authorization` header is hashed and resolved
//! against the token table; on success the owning user id rides along in
//! request extensions as [`AuthedUser`]. Missing or unknown tokens
//! short-circuit with 401 before any handler runs.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::rest::error::ApiError;
use crate::AppContext;

/// The authenticated owner id for the current request.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

/// Extract the raw token from an `Authorization` header value.
/// Returns `None` unless the value is exactly `Bearer <token>`.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_bearer(
    State(ctx): State<Arc<AppContext>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        debug!("request rejected: no bearer token");
        return Err(ApiError::Unauthorized);
    };

    match ctx.storage.resolve_token(token).await {
        Ok(Some(user_id)) => {
            req.extensions_mut().insert(AuthedUser(user_id));
            Ok(next.run(req).await)
        }
        Ok(None) => {
            debug!("request rejected: unknown bearer token");
            Err(ApiError::Unauthorized)
        }
        Err(e) => Err(ApiError::Store(e)),
    }
}
