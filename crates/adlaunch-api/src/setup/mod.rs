//! Application setup and initialization
//!
//! All initialization logic lives here instead of main.rs: configuration
//! validation, telemetry, database, service wiring, and routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use anyhow::{Context, Result};

use adlaunch_core::Config;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(AppState, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production());
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let state = services::initialize_services(&config, pool)?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
