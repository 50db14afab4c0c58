//! # Ingestion Pipeline
//!
//! One linear pass per accepted upload: store the artifact, fold the
//! outcome into an [`AuditRecord`], append the record. The append is
//! attempted exactly once whatever the store did, and nothing in here
//! returns an error; both results travel back in the [`IngestReport`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditLog, AuditRecord};
use crate::error::AuditError;
use crate::naming::UNKNOWN_HASH;
use crate::store::{ArtifactStore, StoreOutcome};

/// Source address recorded when the caller does not report one.
pub const UNKNOWN_SOURCE_IP: &str = "unknown";

/// Body of an upload, as posted by the sender.
///
/// Every field is optional; absent and `null` are treated alike and filled
/// with the defaults below when the audit record is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Base64 image, optionally behind a `data:...,` header.
    #[serde(rename = "imageBase64", skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    /// End-user address. Default `"unknown"`.
    #[serde(rename = "ip", skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    /// Declared payload size. Default `0`.
    #[serde(rename = "fileSize", skip_serializing_if = "Option::is_none")]
    pub declared_size: Option<i64>,
    /// Content fingerprint. Default `"unknown"`.
    #[serde(rename = "sha256Hash", skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Opaque generation options. Default `{}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Map<String, serde_json::Value>>,
    /// Client-side timestamp. Default: server receipt time.
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<String>,
}

impl UploadRequest {
    /// The content hash, or the unknown sentinel.
    pub fn content_hash(&self) -> &str {
        self.content_hash.as_deref().unwrap_or(UNKNOWN_HASH)
    }
}

/// Everything that happened to one upload.
#[derive(Debug)]
pub struct IngestReport {
    /// Artifact store outcome.
    pub outcome: StoreOutcome,
    /// The record handed to the audit log.
    pub record: AuditRecord,
    /// Whether the record reached the log.
    pub audit: Result<(), AuditError>,
}

/// Store + audit, composed.
#[derive(Debug)]
pub struct Ingestor {
    store: ArtifactStore,
    audit: AuditLog,
}

impl Ingestor {
    /// Compose a store and a log.
    pub fn new(store: ArtifactStore, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// The artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The audit log.
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Process one upload received at `received_at`.
    ///
    /// Blocks on filesystem I/O; async callers should run this on a
    /// blocking worker.
    pub fn ingest(&self, request: UploadRequest, received_at: DateTime<FixedOffset>) -> IngestReport {
        let UploadRequest {
            image_base64,
            source_ip,
            declared_size,
            content_hash,
            options,
            client_timestamp,
        } = request;
        let content_hash = content_hash.unwrap_or_else(|| UNKNOWN_HASH.to_string());

        let outcome = self.store.store(
            image_base64.as_deref(),
            &content_hash,
            &received_at.naive_local(),
        );

        let record = AuditRecord {
            timestamp: client_timestamp.unwrap_or_else(|| received_at.to_rfc3339()),
            source_ip: source_ip.unwrap_or_else(|| UNKNOWN_SOURCE_IP.to_string()),
            content_hash,
            declared_size: declared_size.unwrap_or(0),
            options: options.unwrap_or_default(),
            relative_path: outcome.relative_path().to_string(),
            save_succeeded: outcome.succeeded(),
        };

        let audit = self.audit.append(&record);
        if let Err(e) = &audit {
            tracing::error!(
                relative_path = %record.relative_path,
                success = record.save_succeeded,
                error = %e,
                "audit log write failed; record lost"
            );
        }

        IngestReport {
            outcome,
            record,
            audit,
        }
    }
}
