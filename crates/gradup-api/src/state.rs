//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! [`AppConfig`] is built once at start-up (normally from the environment)
//! and never mutated afterwards. [`AppState`] owns the ingestion core and
//! the receipt clock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gradup_core::{ArtifactStore, AuditLog, Clock, Ingestor, SystemClock, WritePolicy};

use crate::auth::SecretToken;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimitConfig;

/// Default upload root.
pub const DEFAULT_UPLOAD_DIR: &str = "/data/grad-uploads";
/// Default audit log file name, relative to the upload root.
pub const DEFAULT_LOG_FILE: &str = "upload_log.jsonl";
/// Default listening port.
pub const DEFAULT_PORT: u16 = 5050;
/// Default budget for each upload's blocking I/O.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);
/// Default request body limit (25 MiB; base64 inflates images by a third).
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

// -- Configuration ------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret for the upload route.
    pub auth_token: SecretToken,
    /// Root of the artifact tree.
    pub upload_dir: PathBuf,
    /// Audit log file; relative paths are resolved against `upload_dir`.
    pub log_file: PathBuf,
    /// How long a handler waits on blocking I/O before answering anyway.
    pub io_timeout: Duration,
    /// Largest accepted upload body.
    pub max_body_bytes: usize,
    /// Artifact write policy.
    pub write_policy: WritePolicy,
    /// Per-client budget; `None` disables rate limiting.
    pub rate_limit: Option<RateLimitConfig>,
    /// Log output format.
    pub log_format: LogFormat,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_KEY environment variable is required and must not be empty")]
    MissingToken,
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl AppConfig {
    /// Configuration with defaults for everything but the secret and root.
    pub fn new(auth_token: SecretToken, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_PORT,
            auth_token,
            upload_dir: upload_dir.into(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            write_policy: WritePolicy::Direct,
            rate_limit: None,
            log_format: LogFormat::Text,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `API_KEY` (required, non-empty)
    /// - `UPLOAD_DIR` (default: `/data/grad-uploads`)
    /// - `UPLOAD_LOG_FILE` (default: `upload_log.jsonl`)
    /// - `PORT` (default: 5050)
    /// - `UPLOAD_IO_TIMEOUT_SECS` (default: 10, must be non-zero)
    /// - `UPLOAD_MAX_BODY_BYTES` (default: 26214400)
    /// - `UPLOAD_STAGED_WRITES` (default: false)
    /// - `UPLOAD_RATE_LIMIT_PER_MIN` (default: unset, no limit)
    /// - `LOG_FORMAT` (`text` or `json`, default: `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("API_KEY")
            .map(SecretToken::new)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let upload_dir = lookup("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());

        let mut config = Self::new(token, upload_dir);
        if let Some(file) = lookup("UPLOAD_LOG_FILE") {
            config.log_file = PathBuf::from(file);
        }
        if let Some(port) = parse_var::<u16>(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "UPLOAD_IO_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "UPLOAD_IO_TIMEOUT_SECS",
                    value: secs.to_string(),
                    reason: "must be at least 1".into(),
                });
            }
            config.io_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = parse_var::<usize>(&lookup, "UPLOAD_MAX_BODY_BYTES")? {
            config.max_body_bytes = bytes;
        }
        if let Some(staged) = parse_var::<bool>(&lookup, "UPLOAD_STAGED_WRITES")? {
            config.write_policy = if staged {
                WritePolicy::Staged
            } else {
                WritePolicy::Direct
            };
        }
        if let Some(per_min) = parse_var::<u64>(&lookup, "UPLOAD_RATE_LIMIT_PER_MIN")? {
            config.rate_limit = Some(RateLimitConfig::per_minute(per_min));
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "" => LogFormat::Text,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LOG_FORMAT",
                        value: format,
                        reason: "expected `text` or `json`".into(),
                    })
                }
            };
        }
        Ok(config)
    }

    /// Absolute audit log location.
    pub fn log_path(&self) -> PathBuf {
        self.upload_dir.join(&self.log_file)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ingestor: Arc<Ingestor>,
    pub clock: Arc<dyn Clock>,
    pub metrics: ApiMetrics,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("ingestor", &self.ingestor)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State driven by the host's wall clock.
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// State with an explicit receipt clock.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = ArtifactStore::new(&config.upload_dir).with_policy(config.write_policy);
        let audit = AuditLog::new(config.log_path());
        Self {
            config: Arc::new(config),
            ingestor: Arc::new(Ingestor::new(store, audit)),
            clock,
            metrics: ApiMetrics::new(),
        }
    }

    /// Create the upload root and the audit log's directory.
    pub fn prepare_storage(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config.upload_dir)?;
        if let Some(parent) = self.ingestor.audit_log().path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
