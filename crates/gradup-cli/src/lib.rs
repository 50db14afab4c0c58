//! # gradup-cli — CLI Tool for Graduation Photo Uploads
//!
//! Provides the `gradup` command-line interface.
//!
//! ## Subcommands
//!
//! - `gradup upload`: Send an image file to a receiver.
//! - `gradup name`: Print the storage path a content hash would receive.
//!
//! ```bash
//! gradup upload portrait.jpg --ip 203.0.113.7 --option gownColor=navy
//! gradup name 3f7a9c21e0 --at 2026-06-01T09:30:15
//! ```

pub mod name;
pub mod upload;
