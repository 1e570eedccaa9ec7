use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use lta_common::LtaError;
use serde_json::json;
use thiserror::Error;

/// REST-layer error shape. Each variant maps to an HTTP status:
/// 400 for malformed/identity-changing bodies, 401 for a
/// missing or invalid bearer token, 403 for a role that doesn't cover the
/// route, 404 for an absent resource, 500 for anything else.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("role does not permit this action")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LtaError> for ApiError {
    fn from(e: LtaError) -> Self {
        match e {
            LtaError::NotFound => ApiError::NotFound,
            LtaError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
