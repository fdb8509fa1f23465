//! Read-side projections over accounts, the ledger and expenses
//!
//! Nothing here writes. Empty result sets come back as zero or empty values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use core_kernel::{AccountId, ExpenseId};

use crate::account::{Actor, BalanceSnapshot, Pool};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::expense::{AccountExpenseTotal, Expense, ExpenseCategory, ExpenseSummary};
use crate::filters::{ExpenseFilter, LedgerFilter};
use crate::ledger::{LedgerEntry, PoolTotals};
use crate::pagination::{Page, PageRequest};
use crate::ports::{AccountStore, ExpenseStore, LedgerStore};

/// Number of expenses shown on the dashboard
pub const DASHBOARD_RECENT: usize = 5;

/// Which expenses an aggregate covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Account(AccountId),
}

impl Scope {
    fn account_id(&self) -> Option<AccountId> {
        match self {
            Scope::All => None,
            Scope::Account(id) => Some(*id),
        }
    }
}

/// Caller-supplied search parameters for transaction listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSearch {
    pub account_id: Option<AccountId>,
    pub pool: Option<Pool>,
    pub date: Option<NaiveDate>,
    pub text: Option<String>,
}

/// Caller-supplied search parameters for expense listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseSearch {
    pub account_id: Option<AccountId>,
    pub category: Option<ExpenseCategory>,
    pub date: Option<NaiveDate>,
    pub text: Option<String>,
}

/// Admin dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub account_count: u64,
    pub expenses: ExpenseSummary,
    pub recent_expenses: Vec<Expense>,
}

#[derive(Clone)]
pub struct LedgerQueries {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    expenses: Arc<dyn ExpenseStore>,
    config: LedgerConfig,
}

impl LedgerQueries {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        expenses: Arc<dyn ExpenseStore>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            accounts,
            ledger,
            expenses,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Builds a ledger filter in the configured timezone
    pub fn ledger_filter(&self, search: TransactionSearch) -> LedgerFilter {
        let mut filter = LedgerFilter::new().in_timezone(self.config.timezone);
        filter.account_id = search.account_id;
        filter.pool = search.pool;
        filter.date = search.date;
        if let Some(text) = search.text {
            filter = filter.with_text(text);
        }
        filter
    }

    /// Builds an expense filter in the configured timezone
    pub fn expense_filter(&self, search: ExpenseSearch) -> ExpenseFilter {
        let mut filter = ExpenseFilter::new().in_timezone(self.config.timezone);
        filter.account_id = search.account_id;
        filter.category = search.category;
        filter.date = search.date;
        if let Some(text) = search.text {
            filter = filter.with_text(text);
        }
        filter
    }

    fn capped(&self, page: PageRequest) -> Result<PageRequest, LedgerError> {
        PageRequest::new(page.page(), page.page_size().min(self.config.max_page_size))
    }

    #[instrument(skip(self, filter))]
    pub async fn list_transactions(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>, LedgerError> {
        Ok(self.ledger.list_entries(filter, self.capped(page)?).await?)
    }

    #[instrument(skip(self, filter))]
    pub async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, LedgerError> {
        Ok(self.expenses.list_expenses(filter, self.capped(page)?).await?)
    }

    pub async fn expense_summary(&self, scope: Scope) -> Result<ExpenseSummary, LedgerError> {
        Ok(self.expenses.summary(scope.account_id()).await?)
    }

    /// The `n` newest expenses, globally or for one account
    pub async fn recent_expenses(&self, scope: Scope, n: usize) -> Result<Vec<Expense>, LedgerError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut filter = ExpenseFilter::new();
        filter.account_id = scope.account_id();
        let size = u32::try_from(n).unwrap_or(u32::MAX);
        let page = self.expenses.list_expenses(&filter, PageRequest::new(1, size)?).await?;
        Ok(page.items)
    }

    pub async fn expense_totals_by_account(&self) -> Result<Vec<AccountExpenseTotal>, LedgerError> {
        Ok(self.expenses.totals_by_account().await?)
    }

    /// Current balances as held by the Account Store
    pub async fn balance_snapshot(&self, account_id: AccountId) -> Result<BalanceSnapshot, LedgerError> {
        let account = self.accounts.get_account(account_id).await?;
        Ok(BalanceSnapshot::from(&account))
    }

    /// Ledger sums per pool; display only
    pub async fn pool_credit_totals(&self, account_id: AccountId) -> Result<PoolTotals, LedgerError> {
        Ok(self.ledger.pool_totals(account_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, LedgerError> {
        let account_count = self.accounts.count_accounts().await?;
        let expenses = self.expense_summary(Scope::All).await?;
        let recent_expenses = self.recent_expenses(Scope::All, DASHBOARD_RECENT).await?;
        Ok(Dashboard {
            account_count,
            expenses,
            recent_expenses,
        })
    }

    /// Fetches an expense visible to the owner or an admin
    pub async fn get_expense(&self, viewer: &Actor, id: ExpenseId) -> Result<Expense, LedgerError> {
        let expense = self.expenses.get_expense(id).await?;
        if expense.account_id != viewer.account_id && !viewer.is_admin() {
            return Err(LedgerError::forbidden(format!(
                "{} may not view expense {}",
                viewer.account_id, id
            )));
        }
        Ok(expense)
    }
}
