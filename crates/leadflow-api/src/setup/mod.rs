//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::{AppState, Stores};
use anyhow::{Context, Result};
use leadflow_core::Config;
use leadflow_infra::LogFormat;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or(LogFormat::Pretty);
    leadflow_infra::init_telemetry("leadflow-api", log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let collaborators = leadflow_services::build_collaborators(&config)
        .await
        .context("Failed to initialize integrations")?;

    let state = services::initialize_services(&config, Stores::postgres(pool), collaborators, None);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
