//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every rejection renders the flat body senders already parse:
//!
//! ```json
//! {"error": "Unauthorized"}
//! ```
//!
//! Parser diagnostics are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error label.
    pub error: String,
}

impl ErrorBody {
    /// Body carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Request-level failures. All of them are raised before the ingestion core
/// is entered; nothing the core does produces one.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, malformed, or wrong bearer token (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Body could not be read or parsed as an upload (400).
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Body exceeded the configured limit (413).
    #[error("Payload Too Large")]
    PayloadTooLarge,

    /// Caller exceeded its request budget (429).
    #[error("Too Many Requests")]
    RateLimited,
}

impl AppError {
    /// HTTP status and the message placed in the response body.
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::InvalidJson(_) => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            Self::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if let Self::InvalidJson(detail) = &self {
            tracing::debug!(%detail, "rejected upload body");
        }

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
