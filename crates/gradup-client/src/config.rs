//! Upload client configuration.
//!
//! Points the client at a receiver endpoint. Both the endpoint and the key
//! are required; there is no sensible default for either.

use url::Url;
use zeroize::Zeroizing;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Configuration for sending uploads to a receiver.
///
/// Custom `Debug` implementation redacts the `api_key` field to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct UploadClientConfig {
    /// Full URL of the upload route, e.g. `http://host:5050/api/grad-upload`.
    pub endpoint: Url,
    /// Bearer secret shared with the receiver.
    pub api_key: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for UploadClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl UploadClientConfig {
    /// Configuration with the default timeout.
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: Zeroizing::new(api_key.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `UPLOAD_API_URL` (required)
    /// - `UPLOAD_API_KEY` (required)
    /// - `UPLOAD_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("UPLOAD_API_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let endpoint = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl("UPLOAD_API_URL".to_string(), e.to_string()))?;
        let api_key = lookup("UPLOAD_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingKey)?;

        let timeout_secs = match lookup("UPLOAD_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
        };

        Ok(Self {
            endpoint,
            api_key: Zeroizing::new(api_key),
            timeout_secs,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("UPLOAD_API_URL environment variable is required")]
    MissingUrl,
    #[error("UPLOAD_API_KEY environment variable is required")]
    MissingKey,
    #[error("UPLOAD_API_KEY is not a valid header value")]
    InvalidKey,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid UPLOAD_TIMEOUT_SECS: {0:?}")]
    InvalidTimeout(String),
}
