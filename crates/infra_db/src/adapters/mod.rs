//! Domain Adapters
//!
//! PostgreSQL implementations of the ledger ports. Each adapter:
//! - Implements one port trait from `domain_ledger`
//! - Translates between domain models and repository row types
//! - Maps `DatabaseError` to `PortError` via [`db_to_port_error`]
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresAccountStore;
//! use domain_ledger::AccountStore;
//!
//! let accounts: Arc<dyn AccountStore> = Arc::new(PostgresAccountStore::new(pool));
//! ```
//!
//! [`db_to_port_error`]: crate::error::db_to_port_error

pub mod accounts;
pub mod expenses;
pub mod ledger;

pub use accounts::PostgresAccountStore;
pub use expenses::PostgresExpenseStore;
pub use ledger::PostgresLedgerStore;

use chrono::Utc;
use sqlx::PgPool;
use std::str::FromStr;

use core_kernel::{AdapterHealth, CoreError, HealthCheckResult};
use domain_ledger::{PageRequest, Pool};

use crate::error::DatabaseError;
use crate::repositories::PoolColumns;

/// Runs `SELECT 1` and reports latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

pub(crate) fn pool_columns(pool: Pool) -> PoolColumns {
    match pool {
        Pool::Company => PoolColumns::COMPANY,
        Pool::Personal => PoolColumns::PERSONAL,
        Pool::Salary => PoolColumns::SALARY,
    }
}

/// Parses a stored text enum, reporting bad data as a serialization error
pub(crate) fn parse_stored<T>(column: &str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr<Err = CoreError>,
{
    value
        .parse()
        .map_err(|e: CoreError| DatabaseError::SerializationError(format!("{}: {}", column, e)))
}

pub(crate) fn version_to_db(version: u64) -> Result<i64, DatabaseError> {
    i64::try_from(version)
        .map_err(|_| DatabaseError::SerializationError(format!("version {} out of range", version)))
}

pub(crate) fn version_from_db(version: i64) -> Result<u64, DatabaseError> {
    u64::try_from(version)
        .map_err(|_| DatabaseError::SerializationError(format!("negative version {}", version)))
}

pub(crate) fn count_from_db(count: i64) -> u64 {
    count.max(0) as u64
}

/// LIMIT and OFFSET for a page request
pub(crate) fn window(page: PageRequest) -> (i64, i64) {
    let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}
