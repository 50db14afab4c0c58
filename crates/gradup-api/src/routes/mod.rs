//! # API Route Modules
//!
//! - `health`: unauthenticated liveness probe.
//! - `upload`: the authenticated ingestion endpoint.

pub mod health;
pub mod upload;
