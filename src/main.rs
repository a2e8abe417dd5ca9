//! MesaHub notification server.
//!
//! Entry point that wires the store clients and the notification
//! orchestrator together and runs until a shutdown signal arrives.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use mesahub_core::config::AppConfig;
use mesahub_core::error::AppError;
use mesahub_notify::engine::NotifierEngine;
use mesahub_notify::taxonomy::TypeCatalog;
use mesahub_store::postgres::PgStore;
use mesahub_store::traits::NotificationStore;

#[tokio::main]
async fn main() {
    let env = std::env::var("MESAHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting MesaHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let pool = mesahub_store::connection::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    mesahub_store::migration::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Store clients + push listener ────────────────────
    let store = Arc::new(PgStore::new(pool, &config.notifier));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_handle = store.start_listener(shutdown_rx.clone()).await?;
    tracing::info!("Store change listener started");

    // ── Step 3: Notification type catalog ────────────────────────
    let definitions = store.load_type_catalog().await?;
    let catalog = if definitions.is_empty() {
        tracing::warn!("Type catalog table is empty, using the built-in catalog");
        TypeCatalog::builtin()
    } else {
        TypeCatalog::from_definitions(definitions)
    };
    tracing::info!(types = catalog.len(), "Notification type catalog loaded");

    // ── Step 4: Start the orchestrator ───────────────────────────
    let engine = NotifierEngine::new(
        store.clone(),
        store.clone(),
        Arc::new(catalog),
        config.notifier.clone(),
    );
    engine.start().await;

    // ── Step 5: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    engine.shutdown().await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(10), listener_handle).await;

    tracing::info!("MesaHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
