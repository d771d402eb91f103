//! API-boundary error taxonomy.
//!
//! Every fallible handler returns [`ApiError`]; conversion to a response
//! happens exactly once, here. Server-side failures (store, import,
//! export) are logged at error level and surface as opaque 500 bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::import::ImportError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("store operation failed: {0}")]
    Store(anyhow::Error),
    #[error("bulk import failed: {0}")]
    BulkImport(anyhow::Error),
    #[error("export failed: {0}")]
    Export(anyhow::Error),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            // Title problems are caller mistakes, not pipeline failures.
            ImportError::MissingTitleColumn | ImportError::MissingTitle { .. } => {
                ApiError::Validation(err.to_string())
            }
            ImportError::Csv(_) => ApiError::BulkImport(err.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Store(e) => {
                error!("store failure: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "store operation failed".to_string())
            }
            ApiError::BulkImport(e) => {
                error!("bulk import failure: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "bulk import failed".to_string())
            }
            ApiError::Export(e) => {
                error!("export failure: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "export failed".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
