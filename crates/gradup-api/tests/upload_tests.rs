//! # Integration Tests for gradup-api
//!
//! Drives the assembled router end to end against a temporary upload root:
//! authentication, body parsing, artifact placement, audit records, rate
//! limiting, body limits, and counters.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gradup_api::auth::SecretToken;
use gradup_api::middleware::rate_limit::RateLimitConfig;
use gradup_api::state::{AppConfig, AppState};
use gradup_core::FixedClock;

const TOKEN: &str = "test-secret";

/// Smallest payload that still looks like a JPEG to a human reader.
const IMAGE: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

fn received_at() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-01-15T01:02:03+00:00").unwrap()
}

/// Helper: state rooted at `root` with a fixed receipt clock.
fn test_state(root: &Path, tweak: impl FnOnce(&mut AppConfig)) -> AppState {
    let mut config = AppConfig::new(SecretToken::new(TOKEN), root);
    tweak(&mut config);
    AppState::with_clock(config, Arc::new(FixedClock(received_at())))
}

fn upload_request(auth: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/grad-upload");
    if let Some(token) = auth {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(body.into()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn log_lines(root: &Path) -> Vec<Value> {
    match std::fs::read_to_string(root.join("upload_log.jsonl")) {
        Ok(text) => text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn files_under(root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(root).unwrap() {
        let entry = entry.unwrap();
        if entry.file_type().unwrap().is_dir() {
            for inner in std::fs::read_dir(entry.path()).unwrap() {
                let inner = inner.unwrap();
                out.push(format!(
                    "{}/{}",
                    entry.file_name().to_string_lossy(),
                    inner.file_name().to_string_lossy()
                ));
            }
        }
    }
    out.sort();
    out
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_credentials() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn missing_auth_is_rejected_without_side_effects() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let body = json!({"imageBase64": STANDARD.encode(IMAGE), "sha256Hash": "abcdef1234"});
    let response = app
        .oneshot(upload_request(None, body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    assert!(files_under(tmp.path()).is_empty());
    assert!(log_lines(tmp.path()).is_empty());
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let response = app
        .oneshot(upload_request(Some("not-the-secret"), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(log_lines(tmp.path()).is_empty());
}

// -- Ingestion ----------------------------------------------------------------

#[tokio::test]
async fn absent_image_is_acknowledged_and_audited() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let response = app
        .oneshot(upload_request(Some(TOKEN), r#"{"ip":"198.51.100.7"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "filename": "260115/260115_010203_00000000.jpg"})
    );
    assert!(files_under(tmp.path()).is_empty());

    let lines = log_lines(tmp.path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], json!(false));
    assert_eq!(lines[0]["ip"], json!("198.51.100.7"));
    assert_eq!(lines[0]["hash"], json!("unknown"));
    assert_eq!(lines[0]["file_size"], json!(0));
    assert_eq!(lines[0]["options"], json!({}));
    assert_eq!(lines[0]["timestamp"], json!("2026-01-15T01:02:03+00:00"));
}

#[tokio::test]
async fn valid_image_is_stored_under_partition() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let body = json!({
        "imageBase64": STANDARD.encode(IMAGE),
        "sha256Hash": "abcdef1234567890",
        "fileSize": IMAGE.len(),
        "ip": "203.0.113.5",
        "options": {"style": "classic", "copies": 2},
        "timestamp": "2026-01-15T01:02:00Z",
    });
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let filename = "260115/260115_010203_abcdef12.jpg";
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "filename": filename})
    );
    assert_eq!(std::fs::read(tmp.path().join(filename)).unwrap(), IMAGE);

    let lines = log_lines(tmp.path());
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        json!({
            "timestamp": "2026-01-15T01:02:00Z",
            "ip": "203.0.113.5",
            "hash": "abcdef1234567890",
            "file_size": IMAGE.len(),
            "options": {"style": "classic", "copies": 2},
            "filename": filename,
            "success": true,
        })
    );
}

#[tokio::test]
async fn data_uri_prefix_is_stripped() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let body = json!({
        "imageBase64": format!("data:image/jpeg;base64,{}", STANDARD.encode(IMAGE)),
        "sha256Hash": "abcdef1234567890",
    });
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = tmp.path().join("260115/260115_010203_abcdef12.jpg");
    assert_eq!(std::fs::read(stored).unwrap(), IMAGE);
    assert_eq!(log_lines(tmp.path())[0]["success"], json!(true));
}

#[tokio::test]
async fn malformed_base64_still_answers_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let body = json!({"imageBase64": "!!not base64!!", "sha256Hash": "deadbeefcafe"});
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["filename"],
        json!("260115/260115_010203_deadbeef.jpg")
    );
    assert!(files_under(tmp.path()).is_empty());
    let lines = log_lines(tmp.path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], json!(false));
}

#[tokio::test]
async fn invalid_json_has_no_side_effects() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let response = app
        .oneshot(upload_request(Some(TOKEN), "{this is not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Invalid JSON"}));
    assert!(files_under(tmp.path()).is_empty());
    assert!(log_lines(tmp.path()).is_empty());
}

#[tokio::test]
async fn content_type_is_not_required() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let request = Request::builder()
        .method("POST")
        .uri("/api/grad-upload")
        .header("Authorization", format!("Bearer {TOKEN}"))
        .header("Content-Type", "text/plain")
        .body(Body::from(r#"{"sha256Hash":"0123456789"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["filename"],
        json!("260115/260115_010203_01234567.jpg")
    );
}

#[tokio::test]
async fn same_second_same_prefix_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    for bytes in [b"first".as_slice(), b"second".as_slice()] {
        let body = json!({"imageBase64": STANDARD.encode(bytes), "sha256Hash": "abcdef12XXXX"});
        let response = app
            .clone()
            .oneshot(upload_request(Some(TOKEN), body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(files_under(tmp.path()), vec!["260115/260115_010203_abcdef12.jpg"]);
    let stored = std::fs::read(tmp.path().join("260115/260115_010203_abcdef12.jpg")).unwrap();
    assert_eq!(stored, b"second");
    assert_eq!(log_lines(tmp.path()).len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_each_get_one_log_line() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |_| {}));

    let handles: Vec<_> = (0..24)
        .map(|n| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = json!({
                    "imageBase64": STANDARD.encode(format!("image-{n}")),
                    "sha256Hash": format!("{n:08x}ffff"),
                    "ip": format!("10.0.0.{n}"),
                });
                app.oneshot(upload_request(Some(TOKEN), body.to_string()))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let lines = log_lines(tmp.path());
    assert_eq!(lines.len(), 24);
    assert!(lines.iter().all(|l| l["success"] == json!(true)));
    assert_eq!(files_under(tmp.path()).len(), 24);
}

#[tokio::test]
async fn staged_writes_leave_only_the_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |c| {
        c.write_policy = gradup_core::WritePolicy::Staged;
    }));

    let body = json!({"imageBase64": STANDARD.encode(IMAGE), "sha256Hash": "abcdef1234"});
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(files_under(tmp.path()), vec!["260115/260115_010203_abcdef12.jpg"]);
}

#[tokio::test]
async fn storage_and_audit_failures_still_answer_ok() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the upload root should be: partition creation fails.
    let root = tmp.path().join("occupied");
    std::fs::write(&root, b"not a directory").unwrap();
    let log_dir = tmp.path().join("missing");
    let state = test_state(&root, |c| c.log_file = log_dir.join("upload_log.jsonl"));
    let metrics = state.metrics.clone();
    let app = gradup_api::app(state);

    let body = json!({"imageBase64": STANDARD.encode(IMAGE), "sha256Hash": "abcdef1234"});
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "filename": "260115/260115_010203_abcdef12.jpg"})
    );
    assert!(!log_dir.exists());

    let snap = metrics.snapshot();
    assert_eq!(snap.errors, 0);
    assert_eq!(snap.uploads, 1);
    assert_eq!(snap.artifacts_saved, 0);
    assert_eq!(snap.artifact_failures, 1);
    assert_eq!(snap.audit_failures, 1);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_audit_log_answers_before_the_write_finishes() {
    let tmp = tempfile::tempdir().unwrap();
    // Opening a FIFO for writing blocks until a reader shows up.
    let fifo = tmp.path().join("upload_log.fifo");
    let status = std::process::Command::new("mkfifo")
        .arg(&fifo)
        .status()
        .unwrap();
    assert!(status.success());

    let state = test_state(tmp.path(), |c| {
        c.log_file = fifo.clone();
        c.io_timeout = Duration::from_millis(200);
    });
    let metrics = state.metrics.clone();
    let app = gradup_api::app(state);

    let body = json!({"imageBase64": STANDARD.encode(IMAGE), "sha256Hash": "abcdef1234"});
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "filename": "260115/260115_010203_abcdef12.jpg"})
    );
    assert_eq!(metrics.snapshot().io_timeouts, 1);
    assert_eq!(metrics.snapshot().uploads, 0);

    // Unblock the worker; it finishes the append it started.
    let reader = tokio::task::spawn_blocking(move || std::fs::read_to_string(&fifo).unwrap());
    let text = tokio::time::timeout(Duration::from_secs(10), reader)
        .await
        .unwrap()
        .unwrap();

    let lines: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], json!(true));
    assert_eq!(lines[0]["filename"], json!("260115/260115_010203_abcdef12.jpg"));
    assert_eq!(
        std::fs::read(tmp.path().join("260115/260115_010203_abcdef12.jpg")).unwrap(),
        IMAGE
    );

    // The worker records its own outcome once the append returns.
    for _ in 0..100 {
        if metrics.snapshot().uploads == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let snap = metrics.snapshot();
    assert_eq!(snap.uploads, 1);
    assert_eq!(snap.artifacts_saved, 1);
    assert_eq!(snap.io_timeouts, 1);
}

// -- Limits -------------------------------------------------------------------

#[tokio::test]
async fn rate_limited_requests_are_not_audited() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |c| {
        c.rate_limit = Some(RateLimitConfig::per_minute(1));
    }));

    let first = app
        .clone()
        .oneshot(upload_request(Some(TOKEN), "{}"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(upload_request(Some(TOKEN), "{}"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await, json!({"error": "Too Many Requests"}));

    assert_eq!(log_lines(tmp.path()).len(), 1);
}

#[tokio::test]
async fn unauthenticated_requests_do_not_spend_budget() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |c| {
        c.rate_limit = Some(RateLimitConfig::per_minute(1));
    }));

    let rejected = app
        .clone()
        .oneshot(upload_request(None, "{}"))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let accepted = app
        .oneshot(upload_request(Some(TOKEN), "{}"))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = gradup_api::app(test_state(tmp.path(), |c| c.max_body_bytes = 64));

    let body = json!({"imageBase64": STANDARD.encode([0u8; 256])});
    let response = app
        .oneshot(upload_request(Some(TOKEN), body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await, json!({"error": "Payload Too Large"}));
    assert!(log_lines(tmp.path()).is_empty());
}

// -- Metrics ------------------------------------------------------------------

#[tokio::test]
async fn counters_follow_requests() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), |_| {});
    let metrics = state.metrics.clone();
    let app = gradup_api::app(state);

    let ok = json!({"imageBase64": STANDARD.encode(IMAGE), "sha256Hash": "abcdef1234"});
    for request in [
        upload_request(Some(TOKEN), ok.to_string()),
        upload_request(Some(TOKEN), "{}".to_string()),
        upload_request(None, "{}".to_string()),
    ] {
        app.clone().oneshot(request).await.unwrap();
    }

    let snap = metrics.snapshot();
    assert_eq!(snap.requests, 3);
    assert_eq!(snap.errors, 1);
    assert_eq!(snap.uploads, 2);
    assert_eq!(snap.artifacts_saved, 1);
    assert_eq!(snap.artifact_failures, 0);
    assert_eq!(snap.audit_failures, 0);
    assert_eq!(snap.io_timeouts, 0);
}
