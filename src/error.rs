use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{lark::RecordStoreError, storage::StorageError, version::VersionError};

/// Application-level error type.
/// Implements `IntoResponse` so handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("Record store error: {0}")]
    RecordStore(#[from] RecordStoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Version store error: {0}")]
    Version(#[from] VersionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;

        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedMedia(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA",
                msg.clone(),
            ),
            AppError::RecordStore(e) => {
                tracing::error!("Record store error: {e}");
                details = e.payload().cloned();
                let code = match e {
                    RecordStoreError::Auth { .. } => "UPSTREAM_AUTH_ERROR",
                    _ => "UPSTREAM_ERROR",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Version(e) => {
                tracing::error!("Version store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "VERSION_STORE_ERROR",
                    "Option version is unavailable".to_string(),
                )
            }
        };

        let mut body = json!({
            "success": false,
            "error": {
                "code": code,
                "message": message
            }
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
