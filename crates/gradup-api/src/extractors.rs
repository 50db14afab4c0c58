//! # Body Extraction
//!
//! Upload senders do not reliably set `Content-Type`, so handlers take the
//! raw body and parse it here instead of using `axum::Json`.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Parse a JSON body regardless of its declared content type.
///
/// Bodies over the route's limit map to [`AppError::PayloadTooLarge`];
/// anything else that fails to read or parse maps to
/// [`AppError::InvalidJson`].
pub fn parse_json_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, AppError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidJson(rejection.body_text())
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::InvalidJson(e.to_string()))
}
