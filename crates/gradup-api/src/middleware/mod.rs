//! # Middleware
//!
//! Request/ingest counters and optional per-client rate limiting. Request
//! tracing is `tower_http::trace::TraceLayer`, mounted in [`crate::app`].

pub mod metrics;
pub mod rate_limit;
