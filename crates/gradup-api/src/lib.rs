//! # gradup-api — Upload Receiver
//!
//! HTTP front of the graduation-photo pipeline. Authenticated senders post
//! base64 images; each one is stored under a time-partitioned name and
//! audited by [`gradup_core::Ingestor`].
//!
//! ## API Surface
//!
//! | Route                    | Module              | Auth   |
//! |--------------------------|---------------------|--------|
//! | `POST /api/grad-upload`  | [`routes::upload`]  | Bearer |
//! | `GET /health`            | [`routes::health`]  | none   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! Rate limiting sits behind authentication, so unauthenticated traffic
//! never spends a client's budget. It is only installed when configured.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// The health probe is mounted outside the auth middleware so it stays
/// reachable without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let mut upload = routes::upload::router(state.config.max_body_bytes)
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware));
    if let Some(limit) = state.config.rate_limit.clone() {
        upload = upload.layer(axum::Extension(RateLimiter::new(limit)));
    }
    let upload = upload
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    Router::new()
        .merge(routes::health::router())
        .merge(upload)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(state.metrics.clone()))
        .with_state(state)
}
