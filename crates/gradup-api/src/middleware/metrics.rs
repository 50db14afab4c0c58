//! # Receiver Metrics
//!
//! In-process atomic counters. The ones that matter operationally are
//! `audit_failures` (a non-zero value means the audit trail has gaps) and
//! `io_timeouts` (the filesystem is slower than the configured budget).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use gradup_core::IngestReport;

/// Shared metrics state. Clones share counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    errors: AtomicU64,
    uploads: AtomicU64,
    artifacts_saved: AtomicU64,
    artifact_failures: AtomicU64,
    audit_failures: AtomicU64,
    io_timeouts: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub uploads: u64,
    pub artifacts_saved: u64,
    pub artifact_failures: u64,
    pub audit_failures: u64,
    pub io_timeouts: u64,
}

impl ApiMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished ingest into the counters.
    pub fn record_ingest(&self, report: &IngestReport) {
        let c = &self.inner;
        c.uploads.fetch_add(1, Ordering::Relaxed);
        match report.outcome.error() {
            None => {
                c.artifacts_saved.fetch_add(1, Ordering::Relaxed);
            }
            Some(e) if !e.is_payload_error() => {
                c.artifact_failures.fetch_add(1, Ordering::Relaxed);
            }
            Some(_) => {}
        }
        if report.audit.is_err() {
            c.audit_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// An ingest whose outcome is unknown because its worker died.
    pub fn record_lost_ingest(&self) {
        self.inner.uploads.fetch_add(1, Ordering::Relaxed);
        self.inner.audit_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A handler stopped waiting on blocking I/O.
    pub fn record_io_timeout(&self) {
        self.inner.io_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            requests: c.requests.load(Ordering::Relaxed),
            errors: c.errors.load(Ordering::Relaxed),
            uploads: c.uploads.load(Ordering::Relaxed),
            artifacts_saved: c.artifacts_saved.load(Ordering::Relaxed),
            artifact_failures: c.artifact_failures.load(Ordering::Relaxed),
            audit_failures: c.audit_failures.load(Ordering::Relaxed),
            io_timeouts: c.io_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Middleware that increments request and error counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.inner.requests.fetch_add(1, Ordering::Relaxed);
        if response.status().is_server_error() || response.status().is_client_error() {
            m.inner.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    response
}
