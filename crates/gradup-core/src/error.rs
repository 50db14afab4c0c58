//! # Error Types
//!
//! Failures of the two core components. Neither is ever propagated to the
//! HTTP caller: the store folds its error into a [`crate::StoreOutcome`],
//! and audit errors only reach telemetry.

use std::path::PathBuf;

use thiserror::Error;

/// The image payload could not be turned into bytes.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload (after stripping any data-URI header) is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// An artifact could not be stored.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No payload was supplied, or it decoded to zero bytes.
    #[error("no image payload supplied")]
    EmptyPayload,

    /// The payload was not decodable.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The date partition directory could not be created.
    #[error("failed to create partition directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact file could not be written.
    #[error("failed to write artifact {path}: {source}")]
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Whether the failure is the caller's (nothing or garbage sent) rather
    /// than the filesystem's.
    pub fn is_payload_error(&self) -> bool {
        matches!(self, Self::EmptyPayload | Self::Decode(_))
    }
}

/// An audit record could not be appended.
#[derive(Error, Debug)]
pub enum AuditError {
    /// The record could not be serialized to JSON.
    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The log file could not be opened for appending.
    #[error("failed to open audit log {path}: {source}")]
    Open {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The line could not be written or synced.
    #[error("failed to append to audit log {path}: {source}")]
    Write {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
