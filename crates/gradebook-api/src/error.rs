use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use gradebook_db::DbError;

/// Failure of a request handler, rendered as `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// `detail` carries the underlying error text back to the caller.
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>, detail: impl Display) -> Self {
        Self::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_conflict() {
            return Self::BadRequest("Email already exists".into());
        }
        error!("Database error: {}", e);
        Self::internal("Database error", e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(message) | Self::Unauthorized(message) | Self::NotFound(message) => {
                json!({ "message": message })
            }
            Self::Internal { message, detail } => json!({ "message": message, "error": detail }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_bad_request() {
        let err = ApiError::from(DbError::Conflict("users.email".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[test]
    fn test_lock_poisoned_is_internal() {
        let err = ApiError::from(DbError::LockPoisoned);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
