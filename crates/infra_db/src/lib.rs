//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the expense ledger using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] own the SQL and speak database row types
//! - [`adapters`] implement the `domain_ledger` ports on top of them
//! - [`MIGRATOR`] carries the embedded schema from `migrations/`
//!
//! Balances are stored on the account row with one version counter per
//! pool; the ledger and expense tables are append-only.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresAccountStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/expense_ledger")).await?;
//! run_migrations(&pool).await?;
//! let accounts = PostgresAccountStore::new(pool.clone());
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

use sqlx::migrate::Migrator;
use tracing::info;

pub use adapters::{PostgresAccountStore, PostgresExpenseStore, PostgresLedgerStore};
pub use error::{db_to_port_error, DatabaseError};
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};

/// Schema migrations embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies pending migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    info!("Running database migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}
