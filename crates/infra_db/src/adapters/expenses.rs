//! PostgreSQL Expense Store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{AccountId, DomainPort, ExpenseId, HealthCheckResult, HealthCheckable, LedgerEntryId, Money, PortError};
use domain_ledger::{
    AccountExpenseTotal, Expense, ExpenseFilter, ExpenseStore, ExpenseSummary, Page, PageRequest,
};

use crate::adapters::{count_from_db, parse_stored, ping, window};
use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::{like_pattern, AccountTotalRow, ExpenseQuery, ExpenseRepository, ExpenseRow};

/// PostgreSQL-backed implementation of [`ExpenseStore`]
#[derive(Debug, Clone)]
pub struct PostgresExpenseStore {
    repository: ExpenseRepository,
    pool: PgPool,
}

impl PostgresExpenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ExpenseRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresExpenseStore {}

#[async_trait]
impl HealthCheckable for PostgresExpenseStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-expense-store").await
    }
}

#[async_trait]
impl ExpenseStore for PostgresExpenseStore {
    #[instrument(skip_all, fields(expense_id = %expense.id, account_id = %expense.account_id))]
    async fn record_expense(&self, expense: Expense) -> Result<ExpenseId, PortError> {
        debug!(amount = %expense.amount, category = %expense.category, "Recording expense");
        let id = expense.id;
        self.repository
            .insert(&expense_to_row(&expense))
            .await
            .map_err(db_to_port_error)?;
        Ok(id)
    }

    #[instrument(skip_all, fields(expense_id = %id))]
    async fn get_expense(&self, id: ExpenseId) -> Result<Expense, PortError> {
        self.repository
            .get(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Expense", id))
            .and_then(|row| row_to_expense(row).map_err(db_to_port_error))
    }

    #[instrument(skip(self, filter))]
    async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, PortError> {
        let (limit, offset) = window(page);
        let query = ExpenseQuery {
            user_id: filter.account_id.map(|id| *id.as_uuid()),
            category: filter.category.map(|c| c.label().to_string()),
            created_between: filter.day_bounds(),
            text: filter.text.as_deref().map(like_pattern),
            limit,
            offset,
        };
        let (rows, total) = self.repository.list(&query).await.map_err(db_to_port_error)?;
        debug!(returned = rows.len(), total, "Listed expenses");

        let items = rows
            .into_iter()
            .map(row_to_expense)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_to_port_error)?;
        Ok(Page {
            items,
            total: count_from_db(total),
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    async fn summary(&self, account_id: Option<AccountId>) -> Result<ExpenseSummary, PortError> {
        let (total, count) = self
            .repository
            .summary(account_id.map(|id| *id.as_uuid()))
            .await
            .map_err(db_to_port_error)?;
        Ok(ExpenseSummary {
            total: Money::new(total),
            count: count_from_db(count),
        })
    }

    async fn totals_by_account(&self) -> Result<Vec<AccountExpenseTotal>, PortError> {
        let rows = self.repository.totals_by_account().await.map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_total).collect())
    }
}

fn expense_to_row(expense: &Expense) -> ExpenseRow {
    ExpenseRow {
        id: *expense.id.as_uuid(),
        user_id: *expense.account_id.as_uuid(),
        transaction_id: *expense.ledger_entry_id.as_uuid(),
        category: expense.category.label().to_string(),
        description: expense.description.clone(),
        amount: expense.amount.amount(),
        image: expense.receipt.clone(),
        user_name: expense.account_name.clone(),
        created_at: expense.created_at,
    }
}

fn row_to_expense(row: ExpenseRow) -> Result<Expense, DatabaseError> {
    Ok(Expense {
        id: ExpenseId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.user_id),
        ledger_entry_id: LedgerEntryId::from_uuid(row.transaction_id),
        category: parse_stored("category", &row.category)?,
        description: row.description,
        amount: Money::new(row.amount),
        receipt: row.image,
        account_name: row.user_name,
        created_at: row.created_at,
    })
}

fn row_to_total(row: AccountTotalRow) -> AccountExpenseTotal {
    AccountExpenseTotal {
        account_id: AccountId::from_uuid(row.user_id),
        account_name: row.user_name,
        total: Money::new(row.total),
        count: count_from_db(row.count),
    }
}
