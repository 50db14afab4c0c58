//! # Upload Route
//!
//! `POST /api/grad-upload`: decode, store, audit, and answer with the
//! relative path the artifact was (or would have been) stored under.
//!
//! Once a request is past authentication and JSON parsing it always
//! receives `200`. Storage and audit failures are logged and counted but
//! never surfaced to the sender.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Json, Router};
use gradup_core::{derive_name, UploadRequest};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::parse_json_body;
use crate::state::AppState;

/// Route path of the upload endpoint.
pub const UPLOAD_PATH: &str = "/api/grad-upload";

/// Acknowledgement returned for every accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    /// Relative path `YYMMDD/YYMMDD_HHMMSS_hash8.jpg`.
    pub filename: String,
}

/// Build the upload router with the given body limit.
pub fn router(max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(UPLOAD_PATH, post(upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

async fn upload(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let request: UploadRequest = parse_json_body(body)?;

    let received_at = state.clock.now();
    let path = derive_name(&received_at.naive_local(), request.content_hash());
    let filename = path.relative_path().to_string();

    // The blocking task owns the whole ingest and its bookkeeping, so a
    // timeout below only stops the wait, never the write.
    let ingestor = state.ingestor.clone();
    let metrics = state.metrics.clone();
    let task = tokio::task::spawn_blocking(move || {
        let report = ingestor.ingest(request, received_at);
        metrics.record_ingest(&report);
        tracing::info!(
            filename = %report.record.relative_path,
            ip = %report.record.source_ip,
            saved = report.outcome.succeeded(),
            logged = report.audit.is_ok(),
            "upload received"
        );
    });

    match tokio::time::timeout(state.config.io_timeout, task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(%filename, error = %e, "upload worker failed");
            state.metrics.record_lost_ingest();
        }
        Err(_) => {
            tracing::warn!(
                %filename,
                timeout_ms = state.config.io_timeout.as_millis() as u64,
                "upload I/O still running; answering without waiting"
            );
            state.metrics.record_io_timeout();
        }
    }

    Ok(Json(UploadResponse {
        status: "ok".to_string(),
        filename,
    }))
}
