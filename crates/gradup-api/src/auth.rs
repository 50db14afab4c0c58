//! # Bearer Token Authentication
//!
//! The upload route is guarded by a single shared secret:
//!
//! ```text
//! Authorization: Bearer {secret}
//! ```
//!
//! The secret is loaded once at start-up into an immutable [`AuthConfig`]
//! and injected into request extensions. Every failure mode answers the
//! same `401 {"error":"Unauthorized"}`; the reason only goes to the log.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::AppError;

// ── Secret ──────────────────────────────────────────────────────────────────

/// Shared bearer secret. Zeroed on drop, redacted in `Debug`.
#[derive(Clone)]
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Whether the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against a presented token.
    pub fn matches(&self, provided: &str) -> bool {
        constant_time_token_eq(provided, self.0.as_str())
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token: SecretToken,
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ, performs a dummy comparison so timing does not
/// reveal the expected length.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Reject the request unless it carries `Authorization: Bearer <secret>`.
///
/// A request without an [`AuthConfig`] extension is rejected too: the
/// route is never reachable unauthenticated by misconfiguration.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(config) = request.extensions().get::<AuthConfig>().cloned() else {
        tracing::error!("authentication failed: no auth configuration on request");
        return AppError::Unauthorized.into_response();
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) if config.token.matches(provided) => next.run(request).await,
            Some(_) => {
                tracing::warn!("authentication failed: invalid bearer token");
                AppError::Unauthorized.into_response()
            }
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                AppError::Unauthorized.into_response()
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            AppError::Unauthorized.into_response()
        }
    }
}
