//! PostgreSQL Account Store
//!
//! Balances live on the `users` row. Writes to a pool go through
//! [`AccountRepository::set_balance`], a version-checked `UPDATE`, so a
//! concurrent writer in another process surfaces as `PortError::Conflict`
//! instead of a lost update.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AccountId, DomainPort, HealthCheckResult, HealthCheckable, Money, PortError,
};
use domain_ledger::{Account, AccountStore, Balances, Pool, ProfileUpdate, Role, VersionedBalance};

use crate::adapters::{count_from_db, parse_stored, ping, pool_columns, version_from_db, version_to_db};
use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::{AccountRepository, BalanceWrite, NewUser, UserProfileUpdate, UserRow};

/// PostgreSQL-backed implementation of [`AccountStore`]
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    repository: AccountRepository,
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AccountRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &AccountRepository {
        &self.repository
    }
}

impl DomainPort for PostgresAccountStore {}

#[async_trait]
impl HealthCheckable for PostgresAccountStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-account-store").await
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip_all, fields(account_id = %account.id, name = %account.name))]
    async fn insert_account(&self, account: Account) -> Result<Account, PortError> {
        debug!("Inserting account");
        let row = self
            .repository
            .insert(NewUser {
                id: *account.id.as_uuid(),
                name: account.name.clone(),
                pin: account.pin.clone(),
                role: account.role.as_str().to_string(),
                salary: account.salary.map(|s| s.amount()),
                created_at: account.created_at,
            })
            .await
            .map_err(account_write_error)?;
        row_to_account(row).map_err(db_to_port_error)
    }

    #[instrument(skip_all, fields(account_id = %id))]
    async fn get_account(&self, id: AccountId) -> Result<Account, PortError> {
        self.repository
            .get(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Account", id))
            .and_then(|row| row_to_account(row).map_err(db_to_port_error))
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, PortError> {
        self.repository
            .find_by_name(name)
            .await
            .map_err(db_to_port_error)?
            .map(row_to_account)
            .transpose()
            .map_err(db_to_port_error)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError> {
        let rows = self.repository.list().await.map_err(db_to_port_error)?;
        rows.into_iter()
            .map(row_to_account)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_to_port_error)
    }

    async fn count_accounts(&self) -> Result<u64, PortError> {
        let count = self.repository.count().await.map_err(db_to_port_error)?;
        Ok(count_from_db(count))
    }

    #[instrument(skip_all, fields(account_id = %id))]
    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, PortError> {
        debug!("Updating account profile");
        let changes = UserProfileUpdate {
            name: update.name,
            pin: update.pin,
            role: update.role.map(|r| r.as_str().to_string()),
            salary: update.salary.map(|s| s.map(|m| m.amount())),
        };
        self.repository
            .update_profile(*id.as_uuid(), changes)
            .await
            .map_err(account_write_error)?
            .ok_or_else(|| PortError::not_found("Account", id))
            .and_then(|row| row_to_account(row).map_err(db_to_port_error))
    }

    #[instrument(skip_all, fields(account_id = %id))]
    async fn delete_account(&self, id: AccountId) -> Result<(), PortError> {
        let deleted = self.repository.delete(*id.as_uuid()).await.map_err(db_to_port_error)?;
        if deleted {
            Ok(())
        } else {
            Err(PortError::not_found("Account", id))
        }
    }

    #[instrument(skip_all, fields(account_id = %id, pool = %pool))]
    async fn get_balance(&self, id: AccountId, pool: Pool) -> Result<VersionedBalance, PortError> {
        let (amount, version) = self
            .repository
            .get_balance(*id.as_uuid(), pool_columns(pool))
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Account", id))?;
        Ok(VersionedBalance {
            amount: Money::new(amount),
            version: version_from_db(version).map_err(db_to_port_error)?,
        })
    }

    #[instrument(skip_all, fields(account_id = %id, pool = %pool))]
    async fn set_balance(
        &self,
        id: AccountId,
        pool: Pool,
        expected_version: u64,
        new_balance: Money,
    ) -> Result<u64, PortError> {
        let expected = version_to_db(expected_version).map_err(db_to_port_error)?;
        let write = self
            .repository
            .set_balance(*id.as_uuid(), pool_columns(pool), expected, new_balance.amount())
            .await
            .map_err(db_to_port_error)?;
        match write {
            BalanceWrite::Applied(version) => version_from_db(version).map_err(db_to_port_error),
            BalanceWrite::VersionMismatch => Err(db_to_port_error(DatabaseError::Conflict(format!(
                "{} balance of {} changed since version {}",
                pool, id, expected_version
            )))),
            BalanceWrite::Missing => Err(PortError::not_found("Account", id)),
        }
    }
}

/// Duplicate names carry the field for API error bodies
fn account_write_error(error: DatabaseError) -> PortError {
    match error {
        DatabaseError::DuplicateEntry(msg) => PortError::validation_field(msg, "name"),
        other => db_to_port_error(other),
    }
}

fn row_to_account(row: UserRow) -> Result<Account, DatabaseError> {
    let role: Role = parse_stored("role", &row.role)?;
    Ok(Account {
        id: AccountId::from_uuid(row.id),
        name: row.name,
        pin: row.pin,
        role,
        salary: row.salary.map(Money::new),
        balances: Balances {
            company: Money::new(row.company_balance),
            personal: Money::new(row.personal_balance),
            salary: Money::new(row.salary_balance),
        },
        created_at: row.created_at,
    })
}
