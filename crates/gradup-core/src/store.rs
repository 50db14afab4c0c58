//! # Artifact Store
//!
//! Writes decoded upload payloads under a time-partitioned tree:
//!
//! ```text
//! {root}/{YYMMDD}/{YYMMDD_HHMMSS}_{hash8}.jpg
//! ```
//!
//! [`ArtifactStore::store`] never returns an error past its boundary. The
//! derived path is always reported, whether or not anything was written,
//! and failures travel as a [`StoreError`] inside the [`StoreOutcome`].
//!
//! Writers racing for the same path are not serialized: the last one to
//! finish wins.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::naming::{derive_name, StoragePath};
use crate::payload;

/// How artifact bytes reach their final path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Create/truncate the final path and write into it. A crash mid-write
    /// can leave a partial file.
    #[default]
    Direct,
    /// Write `{final}.{uuid}.part` in the same directory, then rename it over
    /// the final path. Readers only ever see complete artifacts.
    Staged,
}

/// Result of one store attempt.
#[derive(Debug)]
pub struct StoreOutcome {
    /// Derived location, reported even when nothing was written.
    pub path: StoragePath,
    /// Bytes written, or why nothing was.
    pub result: Result<u64, StoreError>,
}

impl StoreOutcome {
    /// Whether the artifact is on disk.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Relative path of the artifact.
    pub fn relative_path(&self) -> &str {
        self.path.relative_path()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&StoreError> {
        self.result.as_ref().err()
    }
}

/// Filesystem-backed store rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    policy: WritePolicy,
}

impl ArtifactStore {
    /// Create a store rooted at `root` using [`WritePolicy::Direct`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: WritePolicy::default(),
        }
    }

    /// Replace the write policy.
    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Upload root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active write policy.
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Decode `payload` and write it to the path derived from
    /// `(now, content_hash)`.
    ///
    /// An absent or empty payload is reported as
    /// [`StoreError::EmptyPayload`] without touching the filesystem.
    pub fn store(
        &self,
        payload: Option<&str>,
        content_hash: &str,
        now: &NaiveDateTime,
    ) -> StoreOutcome {
        let path = derive_name(now, content_hash);
        let result = self.write(payload, &path);

        match &result {
            Ok(len) => tracing::debug!(
                relative_path = %path,
                bytes = len,
                "artifact stored"
            ),
            Err(StoreError::EmptyPayload) => tracing::debug!(
                relative_path = %path,
                "no image payload, nothing stored"
            ),
            Err(e) => tracing::error!(
                relative_path = %path,
                error = %e,
                "image save failed"
            ),
        }

        StoreOutcome { path, result }
    }

    fn write(&self, payload: Option<&str>, path: &StoragePath) -> Result<u64, StoreError> {
        let raw = match payload {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(StoreError::EmptyPayload),
        };
        let bytes = payload::decode_image(raw)?;
        if bytes.is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        let dir = path.partition_dir(&self.root);
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let target = dir.join(path.filename());
        match self.policy {
            WritePolicy::Direct => write_synced(&target, &bytes),
            WritePolicy::Staged => write_staged(&target, &bytes),
        }
        .map_err(|source| StoreError::Write {
            path: target,
            source,
        })?;

        Ok(bytes.len() as u64)
    }
}

fn write_synced(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(target)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn write_staged(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut staging = target.as_os_str().to_owned();
    staging.push(format!(".{}.part", Uuid::new_v4().simple()));
    let staging = PathBuf::from(staging);

    let result = write_synced(&staging, bytes).and_then(|()| fs::rename(&staging, target));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}
