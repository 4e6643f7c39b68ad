//! # Steel POS API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Steel POS API Server                             │
//! │                                                                         │
//! │  Back office ───► HTTP (8080) ───► Route handlers ───► SQLite          │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                  JWT (HS256)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use steel_api::{create_app, AppState, ServerConfig};
use steel_db::Database;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("Starting Steel POS API server...");
    if config.jwt_secret == steel_api::config::DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    // Connect to database (runs migrations)
    let db = Database::new(config.db_config()).await?;
    info!(path = %config.database_path.display(), "Database ready");

    let state = AppState::new(db.clone(), &config);
    let app = create_app(state);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
