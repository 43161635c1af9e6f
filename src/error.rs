//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Failures while turning a shape into records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("shape must be a JSON object, got {0}")]
    InvalidShape(&'static str),
    #[error("shape nests deeper than {0} levels")]
    TooDeep(usize),
    #[error("invalid directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },
    #[error("generated output exceeds {0} bytes")]
    TooLarge(usize),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: malformed document: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("storage failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Generation(_) | AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let detail = if cfg!(debug_assertions) && status.is_server_error() {
            Some(format!("{:?}", self))
        } else {
            None
        };
        let body = ErrorBody {
            error: self.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}
