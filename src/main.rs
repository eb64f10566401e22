//! SMA Landscape API Server
//!
//! Run with: cargo run --bin landscape
//!
//! # Configuration
//!
//! Reads `LANDSCAPE_CONFIG` when set, otherwise the first of
//! `~/.config/sma-landscape/config.toml`, `/etc/sma-landscape/config.toml`
//! and `./config.toml`. Environment variables override the file:
//! - `LANDSCAPE_HOST`, `LANDSCAPE_PORT`: Bind address (default: 0.0.0.0:8090)
//! - `LANDSCAPE_PORTAL_URL`: Data portal base URL
//! - `LANDSCAPE_INPUT`: Serve a local JSON dump instead of the portal
//! - `LANDSCAPE_TERRITORIES`: ZIP→territory file for the local dump
//! - `LANDSCAPE_AUTH_EMAIL`, `LANDSCAPE_AUTH_PASSWORD`: Login
//! - `LANDSCAPE_DATA_DIR`: Session directory
//! - `LANDSCAPE_LOG_LEVEL`, `LANDSCAPE_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Full filter, wins over the log level

use anyhow::Context;
use sma_landscape::api::{serve, AppState};
use sma_landscape::config::{Config, LoggingConfig};
use sma_landscape::session::{DatasetCache, SessionStore};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("LANDSCAPE_CONFIG") {
        Ok(path) => Config::load_with_env(Path::new(&path))?,
        Err(_) => Config::load_default(),
    };

    init_tracing(&config.logging)?;

    tracing::info!("Starting SMA Landscape API server v{}", env!("CARGO_PKG_VERSION"));

    let source = config
        .record_source()
        .context("Failed to set up the record source")?;
    tracing::info!(source = source.name(), "Record source ready");

    let data_dir = config.session.data_path();
    let session = SessionStore::open(&data_dir)
        .with_context(|| format!("Failed to open session store in {:?}", data_dir))?;
    tracing::info!("Session directory: {:?}", data_dir);

    let cache = match config.session.mirror_path() {
        Some(path) => {
            tracing::info!("Mirroring dataset to {:?}", path);
            DatasetCache::with_mirror(path)
        }
        None => DatasetCache::new(),
    };

    let api_config = config.api_config();
    let state = AppState::new(
        source,
        session,
        cache,
        config.credentials(),
        config.view_options()?,
        api_config.clone(),
    );

    serve(state, &api_config).await?;

    tracing::info!("SMA Landscape shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("sma_landscape={},tower_http=debug", logging.level).into()
    });

    let writer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }

    Ok(())
}
