//! Outgoing upload body and the receiver's acknowledgement.

use chrono::{DateTime, SecondsFormat, Utc};
use gradup_core::UploadRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Image types whose data-URI header is stripped before sending.
const DATA_URI_TYPES: [&str; 4] = ["png", "jpeg", "jpg", "webp"];

/// Body of one upload, ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UploadPayload {
    request: UploadRequest,
}

impl UploadPayload {
    /// Prepare a payload from base64 image data, stamped with the current
    /// UTC time.
    pub fn from_base64(
        data: &str,
        ip: impl Into<String>,
        options: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self::from_base64_at(data, ip, options, Utc::now())
    }

    /// As [`from_base64`](Self::from_base64), with an explicit timestamp.
    pub fn from_base64_at(
        data: &str,
        ip: impl Into<String>,
        options: serde_json::Map<String, serde_json::Value>,
        at: DateTime<Utc>,
    ) -> Self {
        let base64 = strip_image_header(data);
        Self {
            request: UploadRequest {
                image_base64: Some(base64.to_string()),
                source_ip: Some(ip.into()),
                declared_size: Some(approximate_decoded_len(base64)),
                content_hash: Some(sha256_hex(base64)),
                options: Some(options),
                client_timestamp: Some(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            },
        }
    }

    /// The wire body.
    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    /// Declared content hash.
    pub fn content_hash(&self) -> &str {
        self.request.content_hash()
    }
}

/// Acknowledgement returned by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub status: String,
    /// Relative path the receiver assigned.
    pub filename: String,
}

/// Remove a `data:image/<type>;base64,` header for the supported types.
fn strip_image_header(data: &str) -> &str {
    let Some(rest) = data.strip_prefix("data:image/") else {
        return data;
    };
    match rest.split_once(";base64,") {
        Some((kind, body)) if DATA_URI_TYPES.contains(&kind) => body,
        _ => data,
    }
}

/// Decoded size estimate: `ceil(len * 3 / 4)`.
fn approximate_decoded_len(base64: &str) -> i64 {
    let len = base64.len() as i64;
    (len * 3 + 3) / 4
}

fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
