//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::TradebenchError;

/// Errors leave the API as `{"detail": <message>}` with a status mapped
/// from the domain error kind.
#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<TradebenchError> for WebError {
    fn from(err: TradebenchError) -> Self {
        let status = match &err {
            TradebenchError::Format { .. }
            | TradebenchError::InvalidInput { .. }
            | TradebenchError::AlreadyExists { .. }
            | TradebenchError::ContractViolation { .. }
            | TradebenchError::StrategyExecution { .. } => StatusCode::BAD_REQUEST,
            TradebenchError::NotFound { .. } => StatusCode::NOT_FOUND,
            TradebenchError::Database { .. }
            | TradebenchError::DatabaseQuery { .. }
            | TradebenchError::ConfigParse { .. }
            | TradebenchError::ConfigMissing { .. }
            | TradebenchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}
