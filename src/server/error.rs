use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::metrics::record_error;
use crate::emotion::EmotionError;
use crate::storage::StorageError;

pub const DEFAULT_USER_ID: &str = "astronaut_1";

lazy_static! {
    static ref USER_ID_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("Failed to compile user id pattern");
}

/// Errors a handler can return. Bad input maps to 400, everything else to a
/// generic 500 with the details only in the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Analysis failure: {0}")]
    Analysis(#[from] EmotionError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Storage(_) => "storage",
            ApiError::Analysis(_) => "analysis",
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidInput(format!("Malformed multipart body: {}", e.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        record_error(self.kind(), "api");
        match self {
            ApiError::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Falls back to the default user and checks the id is safe to embed in record names.
pub fn resolve_user_id(user_id: Option<&str>) -> Result<String, ApiError> {
    let user_id = match user_id.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_USER_ID.to_string()),
        Some(id) => id,
    };
    validate_user_id(user_id)?;
    Ok(user_id.to_string())
}

pub fn validate_user_id(user_id: &str) -> Result<(), ApiError> {
    if USER_ID_PATTERN.is_match(user_id) {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "Invalid user_id '{}': expected 1-64 letters, digits, '_' or '-'",
            user_id
        )))
    }
}
