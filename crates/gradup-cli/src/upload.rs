//! # Upload Subcommand
//!
//! Reads an image file, base64-encodes it, and posts it to a receiver
//! through [`gradup_client::UploadClient`]. The endpoint and key come from
//! `--url`/`--key`, falling back to `UPLOAD_API_URL`/`UPLOAD_API_KEY`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Args;
use url::Url;

use gradup_client::{UploadClient, UploadClientConfig, UploadPayload, UploadReceipt};

/// Arguments for the `gradup upload` subcommand.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image file to send.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// End-user address recorded with the upload.
    #[arg(long, default_value = "unknown")]
    pub ip: String,

    /// Generation option, repeatable. Values that parse as JSON are sent
    /// as JSON, anything else as a string.
    #[arg(long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    pub options: Vec<(String, serde_json::Value)>,

    /// Upload endpoint. Overrides `UPLOAD_API_URL`.
    #[arg(long)]
    pub url: Option<Url>,

    /// Bearer secret. Overrides `UPLOAD_API_KEY`.
    #[arg(long)]
    pub key: Option<String>,
}

/// Execute the upload subcommand.
pub fn run_upload(args: &UploadArgs) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let receipt = runtime.block_on(upload_file(args))?;

    println!("OK: stored as {}", receipt.filename);
    Ok(0)
}

/// Send `args.file` and return the receiver's acknowledgement.
pub async fn upload_file(args: &UploadArgs) -> Result<UploadReceipt> {
    let config = resolve_config(args)?;
    let payload = read_payload(&args.file, &args.ip, &args.options)?;
    tracing::info!(
        endpoint = %config.endpoint,
        hash = %payload.content_hash(),
        "sending upload"
    );

    let client = UploadClient::new(config)?;
    let receipt = client.send(&payload).await?;
    Ok(receipt)
}

fn resolve_config(args: &UploadArgs) -> Result<UploadClientConfig> {
    let config = UploadClientConfig::from_lookup(|var| match var {
        "UPLOAD_API_URL" => args
            .url
            .as_ref()
            .map(Url::to_string)
            .or_else(|| std::env::var(var).ok()),
        "UPLOAD_API_KEY" => args.key.clone().or_else(|| std::env::var(var).ok()),
        _ => std::env::var(var).ok(),
    })?;
    Ok(config)
}

fn read_payload(
    file: &Path,
    ip: &str,
    options: &[(String, serde_json::Value)],
) -> Result<UploadPayload> {
    if !file.is_file() {
        bail!("file not found: {}", file.display());
    }
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read file: {}", file.display()))?;
    if bytes.is_empty() {
        bail!("file is empty: {}", file.display());
    }

    let options = options.iter().cloned().collect();
    Ok(UploadPayload::from_base64(&STANDARD.encode(bytes), ip, options))
}

fn parse_option(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty option key in {raw:?}"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
