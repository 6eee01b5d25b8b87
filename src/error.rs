use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Error taxonomy for every service operation. Each variant maps to exactly
/// one transport status so the routing layer never re-derives it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input; caller-fixable.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (e.g. email already registered).
    #[error("{0}")]
    Conflict(String),

    /// No record for the given key where the operation requires one.
    #[error("{0}")]
    NotFound(String),

    /// Ownership, activation or one-time-key mismatch.
    #[error("{0}")]
    Forbidden(String),

    /// Bad credentials. Never reveals which credential was wrong.
    #[error("{0}")]
    Unauthorized(String),

    /// Store or dispatch failure during a step that must be atomic.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details stay in the logs, not in the response body.
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { entity, field } => {
                ApiError::Conflict(format!("{entity} already exists with this {field}"))
            }
            StoreError::NotFound { entity, id } => {
                ApiError::NotFound(format!("no {entity} record for id {id}"))
            }
            StoreError::Backend(e) => ApiError::Internal(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
