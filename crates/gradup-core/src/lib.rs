#![deny(missing_docs)]

//! # gradup-core — Ingestion Core for Graduation Photo Uploads
//!
//! Everything with a real invariant lives here; the HTTP surface in
//! `gradup-api` is a thin wrapper around [`Ingestor`].
//!
//! ## Pipeline
//!
//! ```text
//! UploadRequest ─► derive_name ─► ArtifactStore::store ─► AuditRecord ─► AuditLog::append
//! ```
//!
//! 1. **Naming** ([`naming`]): a pure function of server receipt time and
//!    the caller's content hash. One-second resolution, 8-character hash
//!    prefix. Same second + same prefix means the same path: the later
//!    write wins.
//! 2. **Artifact Store** ([`store`]): decodes the base64 payload and writes
//!    it under the date partition. Never fails past its boundary: every
//!    failure comes back as a [`StoreError`] inside a [`StoreOutcome`].
//! 3. **Audit Log** ([`audit`]): appends one JSON line per accepted
//!    request, whatever the store outcome was. Appends are line-atomic under
//!    concurrent callers.
//!
//! The two components share nothing but the success boolean folded into
//! the audit record.

pub mod audit;
pub mod clock;
pub mod error;
pub mod ingest;
pub mod naming;
pub mod payload;
pub mod store;

pub use audit::{AuditLog, AuditRecord};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AuditError, DecodeError, StoreError};
pub use ingest::{IngestReport, Ingestor, UploadRequest};
pub use naming::{derive_name, StoragePath};
pub use store::{ArtifactStore, StoreOutcome, WritePolicy};
