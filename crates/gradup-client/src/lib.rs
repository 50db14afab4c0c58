//! # gradup-client -- Typed client for the upload receiver
//!
//! The sending side of the pipeline: prepares an [`UploadPayload`] from
//! base64 image data and posts it to `POST /api/grad-upload` with the
//! shared bearer secret.
//!
//! Two call styles:
//! - [`UploadClient::send`] returns the receiver's acknowledgement or a
//!   typed [`ClientError`].
//! - [`UploadClient::forward`] never fails. It is meant for callers that
//!   upload as a side effect and must not be slowed or broken by the
//!   receiver being down.

pub mod config;
pub mod error;
pub mod payload;

pub use config::{ConfigError, UploadClientConfig};
pub use error::ClientError;
pub use payload::{UploadPayload, UploadReceipt};

use std::time::Duration;

/// HTTP client for one receiver endpoint.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl UploadClient {
    /// Create a client from configuration.
    pub fn new(config: UploadClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                let mut value = reqwest::header::HeaderValue::from_str(&format!(
                    "Bearer {}",
                    config.api_key.as_str()
                ))
                .map_err(|_| ClientError::Config(ConfigError::InvalidKey))?;
                value.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, value);
                headers
            })
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }

    /// Create a client from `UPLOAD_API_URL` / `UPLOAD_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(UploadClientConfig::from_env()?)
    }

    /// The receiver endpoint.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Post one upload and return the receiver's acknowledgement.
    pub async fn send(&self, payload: &UploadPayload) -> Result<UploadReceipt, ClientError> {
        let endpoint = self.endpoint.to_string();

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                endpoint,
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint,
            source: e,
        })
    }

    /// Post one upload, logging instead of returning any failure.
    pub async fn forward(&self, payload: &UploadPayload) -> Option<UploadReceipt> {
        match self.send(payload).await {
            Ok(receipt) => {
                tracing::debug!(filename = %receipt.filename, "upload forwarded");
                Some(receipt)
            }
            Err(e) => {
                tracing::warn!(
                    hash = %payload.content_hash(),
                    error = %e,
                    "upload forward failed; continuing"
                );
                None
            }
        }
    }
}
