//! # Audit Log
//!
//! Append-only, line-delimited JSON (JSONL). One [`AuditRecord`] per
//! accepted upload, written whether or not the artifact was stored.
//!
//! ## Line Atomicity
//!
//! A record is serialized in full before the file is touched, then written
//! as one buffer (record plus `\n`) to an `O_APPEND` handle while holding
//! the log's mutex. Concurrent callers in this process therefore never
//! interleave partial lines, and the handle is closed when `append`
//! returns on every path.
//!
//! There is no read path, rotation or size cap here.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// One line of the audit log.
///
/// Field names on the wire are those of the log format consumed by
/// operators; Rust names follow the ingestion domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Client-declared timestamp, or server receipt time when absent.
    pub timestamp: String,
    /// Address of the end user, as reported by the caller.
    #[serde(rename = "ip")]
    pub source_ip: String,
    /// Caller-supplied content hash, verbatim.
    #[serde(rename = "hash")]
    pub content_hash: String,
    /// Caller-declared payload size in bytes.
    #[serde(rename = "file_size")]
    pub declared_size: i64,
    /// Opaque generation options.
    pub options: serde_json::Map<String, serde_json::Value>,
    /// Artifact path relative to the upload root.
    #[serde(rename = "filename")]
    pub relative_path: String,
    /// Whether the artifact was written.
    #[serde(rename = "success")]
    pub save_succeeded: bool,
}

impl AuditRecord {
    /// Serialize as one log line, terminator included.
    ///
    /// JSON string escaping guarantees embedded newlines never split the
    /// record.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Shared append-only log file.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Log appending to `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as one line and sync it to disk.
    pub fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = record.to_line()?;

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| AuditError::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(&line)
            .and_then(|()| file.sync_data())
            .map_err(|source| AuditError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
