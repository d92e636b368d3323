//! services/api/src/bin/api.rs

use mesto_api::{
    adapters::{DbAdapter, MemoryAdapter},
    config::Config,
    error::ApiError,
    telemetry,
    web::{self, state::AppState},
};
use mesto_core::ports::DatabaseService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    let sinks = telemetry::init(&config)?;
    info!(environment = ?config.environment, "Configuration loaded. Starting server...");

    // --- 2. Choose the Store ---
    let (db, pool_adapter): (Arc<dyn DatabaseService>, Option<Arc<DbAdapter>>) =
        match &config.database_url {
            Some(url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                (db_adapter.clone(), Some(db_adapter))
            }
            None => {
                warn!("DATABASE_URL is not set; using the in-memory store");
                (Arc::new(MemoryAdapter::new()), None)
            }
        };

    // --- 3. Build the Shared AppState & Router ---
    let app_state = Arc::new(
        AppState::new(db, config.clone()).map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    let app = web::router(app_state)?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- 5. Release Resources ---
    if let Some(db_adapter) = pool_adapter {
        db_adapter.close().await;
        info!("Database pool closed.");
    }
    if let Err(e) = sinks.flush() {
        error!("Failed to flush log files: {e}");
    }
    info!("Server stopped.");

    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received; draining connections.");
}
