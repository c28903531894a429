pub mod api;
pub mod authorization;
pub mod config;
pub mod db;
pub mod extract;
pub mod interactions;
pub mod models;
pub mod notify;
pub mod ocr;
pub mod prescriptions;
pub mod reference;
pub mod reminders;
pub mod scheduler;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::router::api_router;
use crate::api::server::start_server;
use crate::api::types::ApiContext;
use crate::authorization::ActionTokenStore;
use crate::notify::http::HttpNotifier;
use crate::ocr::OcrClient;
use crate::scheduler::{start_sweep_loop, SweepContext, SystemClock};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("Failed to load reference data: {0}")]
    Reference(#[from] reference::ReferenceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize tracing from `RUST_LOG`, defaulting to info.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Wire everything together and run until interrupted: load reference
/// data, open the database, start the sweep loop, serve the API.
pub async fn run() -> Result<(), AppError> {
    let config = config::Config::from_env();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let reference = Arc::new(reference::ReferenceData::load(&config.reference_dir)?);

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Run migrations once up front; later connections find the schema
    // in place.
    let sweep_conn = db::sqlite::open_database(&config.database_path)?;

    let tokens = Arc::new(ActionTokenStore::new());
    let notifier = Arc::new(HttpNotifier::new(
        config.push_url.clone(),
        config.email_url.clone(),
        config.whatsapp_url.clone(),
    ));

    let mut sweep_handle = start_sweep_loop(
        sweep_conn,
        SweepContext { notifier: notifier.clone(), tokens: tokens.clone() },
        Arc::new(SystemClock),
        config.timezone,
    );

    let ctx = ApiContext::new(
        config.database_path.clone(),
        reference,
        tokens,
        notifier,
        config.ocr_url.clone().map(OcrClient::new),
        config.timezone,
        config.cron_secret.clone(),
    );

    let mut server = start_server(&config.bind_addr, api_router(ctx)).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    server.shutdown();
    sweep_handle.shutdown();
    Ok(())
}
