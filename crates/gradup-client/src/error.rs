//! Client error type.

use crate::config::ConfigError;

/// Errors returned by [`UploadClient::send`](crate::UploadClient::send).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The client could not be built from its configuration.
    #[error("client configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The request never produced a response (connect, timeout, TLS).
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The receiver answered with a non-success status.
    #[error("receiver at {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The receiver's acknowledgement could not be parsed.
    #[error("unexpected acknowledgement from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// HTTP status of a [`ClientError::Status`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
