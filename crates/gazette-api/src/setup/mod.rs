//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use gazette_core::Config;
use gazette_infra::LogFormat;
use gazette_services::{create_legacy_store, HttpPrimaryFetcher, MediaResolver};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration, before anything connects anywhere
    config.validate().context("Configuration validation failed")?;

    let log_format = config
        .base
        .log_format
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!(e))?;
    gazette_infra::init_telemetry(log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        legacy_backend = %config.legacy.backend,
        "Configuration loaded and validated successfully"
    );

    let resolver = build_resolver(&config)?;
    let state = Arc::new(AppState::new(config.clone(), resolver));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire the primary fetcher and the configured legacy store into a resolver.
pub fn build_resolver(config: &Config) -> Result<MediaResolver> {
    let fetcher = HttpPrimaryFetcher::new(&config.primary)
        .context("Failed to build primary HTTP client")?;

    let legacy = create_legacy_store(config).context("Failed to set up legacy store")?;
    match &legacy {
        Some(store) => tracing::info!(
            backend = %store.backend_type(),
            asset_dir = %store.asset_dir(),
            "Legacy store enabled"
        ),
        None => tracing::warn!("Legacy store disabled; primary failures will not fall back"),
    }

    Ok(
        MediaResolver::new(Arc::new(fetcher), legacy, config.primary.timeout)
            .with_video_passthrough(config.primary.video_passthrough)
            .with_legacy_timeout(config.legacy.ftp_timeout),
    )
}
