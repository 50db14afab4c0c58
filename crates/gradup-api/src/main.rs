//! # gradup-api — Binary Entry Point
//!
//! Starts the upload receiver. Configuration comes from the environment
//! (see [`AppConfig::from_env`]); a missing `API_KEY` aborts start-up.

use gradup_api::state::{AppConfig, AppState, LogFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    // Initialize structured tracing. The format comes from the config, so
    // a config error is reported in the default text format.
    let format = config
        .as_ref()
        .map(|c| c.log_format)
        .unwrap_or(LogFormat::Text);
    init_tracing(format);

    let config = config.map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;
    let port = config.port;

    let state = AppState::new(config);
    state.prepare_storage().map_err(|e| {
        tracing::error!(
            upload_dir = %state.config.upload_dir.display(),
            "Failed to prepare upload directory: {e}"
        );
        e
    })?;
    tracing::info!(
        upload_dir = %state.config.upload_dir.display(),
        audit_log = %state.ingestor.audit_log().path().display(),
        write_policy = ?state.config.write_policy,
        "Storage ready"
    );

    let app = gradup_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Upload receiver listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Upload receiver stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
