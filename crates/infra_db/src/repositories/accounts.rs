//! Account repository implementation
//!
//! Rows of the `users` table: identity, PIN, role and the three running
//! balances with their per-pool version counters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

const USER_COLUMNS: &str = "id, name, pin, role, salary, company_balance, personal_balance, \
     salary_balance, company_version, personal_version, salary_version, created_at";

/// Balance column and version column of one pool
///
/// Column names are fixed strings, never caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolColumns {
    pub balance: &'static str,
    pub version: &'static str,
}

impl PoolColumns {
    pub const COMPANY: PoolColumns = PoolColumns {
        balance: "company_balance",
        version: "company_version",
    };
    pub const PERSONAL: PoolColumns = PoolColumns {
        balance: "personal_balance",
        version: "personal_version",
    };
    pub const SALARY: PoolColumns = PoolColumns {
        balance: "salary_balance",
        version: "salary_version",
    };
}

/// Outcome of a versioned balance write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceWrite {
    /// Written; carries the new version
    Applied(i64),
    /// The row exists but its version moved
    VersionMismatch,
    /// No such account
    Missing,
}

/// Repository for the `users` table
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: NewUser) -> Result<UserRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, pin, role, salary, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.pin)
            .bind(&user.role)
            .bind(user.salary)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => DatabaseError::duplicate("Account", "name", &user.name),
                other => other,
            })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<UserRow>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserRow>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1");
        Ok(sqlx::query_as::<_, UserRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<UserRow>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name, id");
        Ok(sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Updates profile columns; `None` leaves a column unchanged
    pub async fn update_profile(&self, id: Uuid, update: UserProfileUpdate) -> Result<Option<UserRow>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE users SET
                name   = COALESCE($2, name),
                pin    = COALESCE($3, pin),
                role   = COALESCE($4, role),
                salary = CASE WHEN $5 THEN $6 ELSE salary END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let (set_salary, salary) = match update.salary {
            Some(value) => (true, value),
            None => (false, None),
        };
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.pin.as_deref())
            .bind(update.role.as_deref())
            .bind(set_salary)
            .bind(salary)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => DatabaseError::duplicate(
                    "Account",
                    "name",
                    update.name.as_deref().unwrap_or_default(),
                ),
                other => other,
            })
    }

    /// Returns false if no row was deleted
    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reads one pool's balance and version
    pub async fn get_balance(&self, id: Uuid, pool: PoolColumns) -> Result<Option<(Decimal, i64)>, DatabaseError> {
        let sql = format!(
            "SELECT {} AS amount, {} AS version FROM users WHERE id = $1",
            pool.balance, pool.version
        );
        Ok(sqlx::query_as::<_, (Decimal, i64)>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Compare-and-swap on one pool's version
    pub async fn set_balance(
        &self,
        id: Uuid,
        pool: PoolColumns,
        expected_version: i64,
        new_balance: Decimal,
    ) -> Result<BalanceWrite, DatabaseError> {
        let sql = format!(
            "UPDATE users SET {b} = $1, {v} = {v} + 1 WHERE id = $2 AND {v} = $3 RETURNING {v}",
            b = pool.balance,
            v = pool.version
        );
        let updated = sqlx::query_scalar::<_, i64>(&sql)
            .bind(new_balance)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(version) = updated {
            return Ok(BalanceWrite::Applied(version));
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        debug!(%id, column = pool.balance, exists, "Versioned balance write did not apply");
        Ok(if exists {
            BalanceWrite::VersionMismatch
        } else {
            BalanceWrite::Missing
        })
    }
}

/// Database row for an account
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub pin: String,
    pub role: String,
    pub salary: Option<Decimal>,
    pub company_balance: Decimal,
    pub personal_balance: Decimal,
    pub salary_balance: Decimal,
    pub company_version: i64,
    pub personal_version: i64,
    pub salary_version: i64,
    pub created_at: DateTime<Utc>,
}

/// Data for creating an account; balances start at zero
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub pin: String,
    pub role: String,
    pub salary: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Profile columns to change
#[derive(Debug, Clone, Default)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub pin: Option<String>,
    pub role: Option<String>,
    /// `Some(None)` clears the salary
    pub salary: Option<Option<Decimal>>,
}
