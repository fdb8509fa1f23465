//! PostgreSQL Ledger Store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{AccountId, DomainPort, HealthCheckResult, HealthCheckable, LedgerEntryId, Money, PortError};
use domain_ledger::{LedgerEntry, LedgerFilter, LedgerStore, Page, PageRequest, Pool, PoolTotals, SalaryPeriod};

use crate::adapters::{count_from_db, parse_stored, ping, window};
use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::{like_pattern, EntryQuery, EntryRow, LedgerRepository};

/// PostgreSQL-backed implementation of [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    repository: LedgerRepository,
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LedgerRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-ledger-store").await
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip_all, fields(entry_id = %entry.id, account_id = %entry.account_id, pool = %entry.pool))]
    async fn append_entry(&self, entry: LedgerEntry) -> Result<LedgerEntryId, PortError> {
        debug!(amount = %entry.amount, "Appending ledger entry");
        let id = entry.id;
        self.repository
            .insert(&entry_to_row(&entry))
            .await
            .map_err(db_to_port_error)?;
        Ok(id)
    }

    #[instrument(skip_all, fields(entry_id = %id))]
    async fn get_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, PortError> {
        self.repository
            .get(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("LedgerEntry", id))
            .and_then(|row| row_to_entry(row).map_err(db_to_port_error))
    }

    #[instrument(skip(self, filter))]
    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>, PortError> {
        let (limit, offset) = window(page);
        let query = EntryQuery {
            user_id: filter.account_id.map(|id| *id.as_uuid()),
            pool: filter.pool.map(|p| p.as_str().to_string()),
            created_between: filter.day_bounds(),
            text: filter.text.as_deref().map(like_pattern),
            limit,
            offset,
        };
        let (rows, total) = self.repository.list(&query).await.map_err(db_to_port_error)?;
        debug!(returned = rows.len(), total, "Listed ledger entries");

        let items = rows
            .into_iter()
            .map(row_to_entry)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_to_port_error)?;
        Ok(Page {
            items,
            total: count_from_db(total),
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    #[instrument(skip_all, fields(account_id = %account_id))]
    async fn pool_totals(&self, account_id: AccountId) -> Result<PoolTotals, PortError> {
        let sums = self
            .repository
            .pool_totals(*account_id.as_uuid())
            .await
            .map_err(db_to_port_error)?;
        let mut totals = PoolTotals::default();
        for (pool, sum) in sums {
            let pool: Pool = parse_stored("type", &pool).map_err(db_to_port_error)?;
            totals
                .add(pool, Money::new(sum))
                .map_err(|e| PortError::internal(format!("pool total out of range: {}", e)))?;
        }
        Ok(totals)
    }
}

fn entry_to_row(entry: &LedgerEntry) -> EntryRow {
    EntryRow {
        id: *entry.id.as_uuid(),
        user_id: *entry.account_id.as_uuid(),
        r#type: entry.pool.as_str().to_string(),
        amount: entry.amount.amount(),
        salary_month: entry.period.map(|p| p.first_day()),
        description: entry.description.clone(),
        user_name: entry.actor_name.clone(),
        recorded_by: entry.recorded_by.map(|id| *id.as_uuid()),
        created_at: entry.created_at,
    }
}

fn row_to_entry(row: EntryRow) -> Result<LedgerEntry, DatabaseError> {
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.user_id),
        pool: parse_stored("type", &row.r#type)?,
        amount: Money::new(row.amount),
        period: row.salary_month.map(SalaryPeriod::containing),
        description: row.description,
        actor_name: row.user_name,
        recorded_by: row.recorded_by.map(AccountId::from_uuid),
        created_at: row.created_at,
    })
}
