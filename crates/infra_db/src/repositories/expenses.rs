//! Expense repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

const EXPENSE_COLUMNS: &str =
    "id, user_id, transaction_id, category, description, amount, image, user_name, created_at";

/// Repository for the `expenses` table
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, expense: &ExpenseRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO expenses
                (id, user_id, transaction_id, category, description, amount, image, user_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(expense.transaction_id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(expense.image.as_deref())
        .bind(&expense.user_name)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ExpenseRow>, DatabaseError> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1");
        Ok(sqlx::query_as::<_, ExpenseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(&self, query: &ExpenseQuery) -> Result<(Vec<ExpenseRow>, i64), DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM expenses");
        query.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses"));
        query.push_where(&mut select);
        select
            .push(" ORDER BY created_at DESC, seq DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        let rows = select.build_query_as::<ExpenseRow>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Total amount and row count, optionally for one account
    pub async fn summary(&self, user_id: Option<Uuid>) -> Result<(Decimal, i64), DatabaseError> {
        Ok(sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(amount), 0), COUNT(*)
            FROM expenses
            WHERE $1::uuid IS NULL OR user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Per-account totals, largest first; the name is the most recent one recorded
    pub async fn totals_by_account(&self) -> Result<Vec<AccountTotalRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, AccountTotalRow>(
            r#"
            SELECT
                user_id,
                (array_agg(user_name ORDER BY created_at DESC, seq DESC))[1] AS user_name,
                SUM(amount) AS total,
                COUNT(*) AS count
            FROM expenses
            GROUP BY user_id
            ORDER BY total DESC, user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}

/// Database row for an expense
#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub image: Option<String>,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AccountTotalRow {
    pub user_id: Uuid,
    pub user_name: String,
    pub total: Decimal,
    pub count: i64,
}

/// Filter and window for [`ExpenseRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub user_id: Option<Uuid>,
    pub category: Option<String>,
    pub created_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub text: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl ExpenseQuery {
    fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut sep = " WHERE ";
        if let Some(user_id) = self.user_id {
            builder.push(sep).push("user_id = ").push_bind(user_id);
            sep = " AND ";
        }
        if let Some(category) = &self.category {
            builder.push(sep).push("category = ").push_bind(category.clone());
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
