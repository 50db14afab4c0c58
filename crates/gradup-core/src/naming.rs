//! # Artifact Naming Policy
//!
//! Derives the storage path of an artifact from the server's receipt time
//! and the caller-supplied content hash:
//!
//! ```text
//! {YYMMDD}/{YYMMDD_HHMMSS}_{hash8}.jpg
//! ```
//!
//! ## Collision Policy
//!
//! Resolution is one second. Two uploads received in the same second whose
//! hashes share the first eight characters map to the same path, and the
//! later write overwrites the earlier one. The audit log records the same
//! path for both, so log and file tree stay consistent.
//!
//! The hash is never verified against the payload; it only disambiguates
//! names.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Number of hash characters embedded in a filename.
pub const HASH_PREFIX_LEN: usize = 8;

/// Prefix used when the caller supplied no usable hash.
pub const FALLBACK_HASH_PREFIX: &str = "00000000";

/// Sentinel the upload API substitutes for an absent hash.
pub const UNKNOWN_HASH: &str = "unknown";

/// Extension of every stored artifact. Payloads are not transcoded.
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Format of the date partition directory.
const DATE_FORMAT: &str = "%y%m%d";

/// Format of the time component of the filename.
const TIME_FORMAT: &str = "%y%m%d_%H%M%S";

/// Storage location of one artifact, relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    date_partition: String,
    time_partition: String,
    filename: String,
    relative_path: String,
}

impl StoragePath {
    /// Date directory, e.g. `260115`.
    pub fn date_partition(&self) -> &str {
        &self.date_partition
    }

    /// Time component, e.g. `260115_093012`.
    pub fn time_partition(&self) -> &str {
        &self.time_partition
    }

    /// File name inside the date directory, e.g. `260115_093012_abcdef12.jpg`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `/`-separated path relative to the upload root. This is the value
    /// returned to callers and written to the audit log.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Absolute directory of the date partition under `root`.
    pub fn partition_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.date_partition)
    }

    /// Absolute file path under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.partition_dir(root).join(&self.filename)
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.relative_path)
    }
}

/// Derive the storage path for an upload received at `now`.
///
/// Pure: identical inputs always give identical output, and there is no
/// failure mode.
pub fn derive_name(now: &NaiveDateTime, content_hash: &str) -> StoragePath {
    let date_partition = now.format(DATE_FORMAT).to_string();
    let time_partition = now.format(TIME_FORMAT).to_string();
    let filename = format!(
        "{time_partition}_{}.{ARTIFACT_EXTENSION}",
        hash_prefix(content_hash)
    );
    let relative_path = format!("{date_partition}/{filename}");

    StoragePath {
        date_partition,
        time_partition,
        filename,
        relative_path,
    }
}

/// First [`HASH_PREFIX_LEN`] characters of the hash, or
/// [`FALLBACK_HASH_PREFIX`] when the hash is empty or the unknown sentinel.
///
/// The hash is caller-controlled, so anything outside `[A-Za-z0-9_-]` is
/// replaced with `_` to keep the name inside its partition.
pub fn hash_prefix(content_hash: &str) -> String {
    if content_hash.is_empty() || content_hash == UNKNOWN_HASH {
        return FALLBACK_HASH_PREFIX.to_string();
    }
    content_hash
        .chars()
        .take(HASH_PREFIX_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
