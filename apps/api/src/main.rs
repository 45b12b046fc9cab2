//! Quire API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod resource_catalog;
mod state;

use quire_core::AppError;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, StorageBackend, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = match &config.storage_backend {
        StorageBackend::Postgres { database_url } => {
            Some(api_services::connect_and_migrate(database_url).await?)
        }
        StorageBackend::Memory => None,
    };

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = api_services::build_app_state(&config, pool).await?;
    let audit_writer = app_state.audit_writer.clone();
    let app = api_router::build_router(app_state, &config.frontend_origin)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(
        %address,
        backend = config.storage_backend.as_str(),
        "quire api listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))?;

    audit_writer.shutdown().await?;
    let stats = audit_writer.stats();
    info!(
        written = stats.written,
        failed = stats.failed,
        dropped = stats.dropped,
        "audit writer drained"
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("shutdown requested");
}
