//! # Name Subcommand
//!
//! Previews the relative path the receiver would assign to an upload with
//! a given content hash at a given local time. Useful for locating an
//! artifact from an audit record or a sender's log.

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Args;

use gradup_core::{derive_name, StoragePath};

const AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Arguments for the `gradup name` subcommand.
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Content hash as sent in `sha256Hash`.
    #[arg(value_name = "HASH")]
    pub hash: String,

    /// Receiver local time, `YYYY-MM-DDTHH:MM:SS`. Defaults to now.
    #[arg(long, value_name = "TIME", value_parser = parse_at)]
    pub at: Option<NaiveDateTime>,
}

/// Execute the name subcommand.
pub fn run_name(args: &NameArgs) -> Result<u8> {
    let at = args
        .at
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    println!("{}", storage_path(&args.hash, &at));
    Ok(0)
}

fn storage_path(hash: &str, at: &NaiveDateTime) -> StoragePath {
    tracing::debug!(%hash, %at, "deriving storage path");
    derive_name(at, hash)
}

fn parse_at(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, AT_FORMAT)
        .map_err(|e| format!("expected {AT_FORMAT}: {e}"))
}
