//! Expense Ledger - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_JWT_SECRET=... API_DATABASE_URL=postgres://... cargo run --bin expense-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `API_LOG_FORMAT` - `text` or `json`
//! * `API_BOOTSTRAP_ADMIN_NAME` / `API_BOOTSTRAP_ADMIN_PIN` - first admin
//! * `API_LEDGER__TIMEZONE`, `API_LEDGER__MAX_CAS_ATTEMPTS`, ... - ledger settings

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresAccountStore, PostgresExpenseStore,
    PostgresLedgerStore,
};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API configuration")?;
    init_tracing(&config.log_level, config.log_format);

    info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.ledger.timezone,
        "Starting Expense Ledger API Server"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone())
            .max_connections(config.database_max_connections),
    )
    .await
    .context("failed to connect to database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;

    let state = AppState::new(
        Arc::new(PostgresAccountStore::new(pool.clone())),
        Arc::new(PostgresLedgerStore::new(pool.clone())),
        Arc::new(PostgresExpenseStore::new(pool)),
        config.clone(),
    );

    if let Some((name, pin)) = config.bootstrap_admin() {
        match state.directory.bootstrap_admin(name, pin).await? {
            Some(admin) => info!(account_id = %admin.id, "Created bootstrap administrator"),
            None => info!("Accounts already exist; bootstrap administrator skipped"),
        }
    }

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;
    info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
