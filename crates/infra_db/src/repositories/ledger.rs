//! Balance transaction repository
//!
//! The `balance_transactions` table is append-only. Rows are never updated
//! or deleted and carry no foreign key to `users`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

const ENTRY_COLUMNS: &str =
    "id, user_id, type, amount, salary_month, description, user_name, recorded_by, created_at";

/// Repository for ledger entries
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &EntryRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO balance_transactions
                (id, user_id, type, amount, salary_month, description, user_name, recorded_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.r#type)
        .bind(entry.amount)
        .bind(entry.salary_month)
        .bind(entry.description.as_deref())
        .bind(&entry.user_name)
        .bind(entry.recorded_by)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<EntryRow>, DatabaseError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM balance_transactions WHERE id = $1");
        Ok(sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// One page of matching entries, newest first, plus the total match count
    pub async fn list(&self, query: &EntryQuery) -> Result<(Vec<EntryRow>, i64), DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM balance_transactions");
        query.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ENTRY_COLUMNS} FROM balance_transactions"
        ));
        query.push_where(&mut select);
        select
            .push(" ORDER BY created_at DESC, seq DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        let rows = select.build_query_as::<EntryRow>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Net sum of amounts per pool type for one account
    pub async fn pool_totals(&self, user_id: Uuid) -> Result<Vec<(String, Decimal)>, DatabaseError> {
        Ok(sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT type, COALESCE(SUM(amount), 0)
            FROM balance_transactions
            WHERE user_id = $1
            GROUP BY type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

/// Database row for a ledger entry
#[derive(Debug, Clone, FromRow)]
pub struct EntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub r#type: String,
    pub amount: Decimal,
    pub salary_month: Option<NaiveDate>,
    pub description: Option<String>,
    pub user_name: String,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Filter and window for [`LedgerRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    pub user_id: Option<Uuid>,
    pub pool: Option<String>,
    /// Half-open `[start, end)` on `created_at`
    pub created_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Already a LIKE pattern, see [`super::like_pattern`]
    pub text: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl EntryQuery {
    fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut sep = " WHERE ";
        if let Some(user_id) = self.user_id {
            builder.push(sep).push("user_id = ").push_bind(user_id);
            sep = " AND ";
        }
        if let Some(pool) = &self.pool {
            builder.push(sep).push("type = ").push_bind(pool.clone());
            sep = " AND ";
        }
        if let Some((start, end)) = self.created_between {
            builder
                .push(sep)
                .push("created_at >= ")
                .push_bind(start)
                .push(" AND created_at < ")
                .push_bind(end);
            sep = " AND ";
        }
        if let Some(pattern) = &self.text {
            builder
                .push(sep)
                .push("(description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR user_name ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }
    }
}
