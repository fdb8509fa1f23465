//! Ledger Domain Ports
//!
//! Storage interfaces the ledger services depend on. Each port is pure
//! storage with no business rules; the Balance Mutator and Query Layer
//! own the logic.
//!
//! - **Postgres adapters** live in `infra_db`
//! - **In-memory adapters** live in [`crate::memory`] (tests and the `mock` feature)
//!
//! ```rust,ignore
//! let mutator = BalanceMutator::new(accounts, ledger, expenses, &config);
//! let applied = mutator.apply_delta(request).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{AccountId, DomainPort, ExpenseId, HealthCheckable, LedgerEntryId, Money, PortError};

use crate::account::{Account, Pool, ProfileUpdate, VersionedBalance};
use crate::expense::{AccountExpenseTotal, Expense, ExpenseSummary};
use crate::filters::{ExpenseFilter, LedgerFilter};
use crate::ledger::{LedgerEntry, PoolTotals};
use crate::pagination::{Page, PageRequest};

/// Account Store port
///
/// Holds identity, role and the three running balances per account.
/// Concurrent writers are not serialized here; `set_balance` is a
/// compare-and-swap so a lost race is reported instead of overwriting.
#[async_trait]
pub trait AccountStore: DomainPort + HealthCheckable {
    /// Inserts a new account; a duplicate name is a `Validation` error
    async fn insert_account(&self, account: Account) -> Result<Account, PortError>;

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError>;

    /// Exact (case-sensitive) name lookup
    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, PortError>;

    /// All accounts ordered by name
    async fn list_accounts(&self) -> Result<Vec<Account>, PortError>;

    async fn count_accounts(&self) -> Result<u64, PortError>;

    /// Applies profile fields only; balances are untouched
    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, PortError>;

    async fn delete_account(&self, id: AccountId) -> Result<(), PortError>;

    /// Reads one pool's balance and its version
    async fn get_balance(&self, id: AccountId, pool: Pool) -> Result<VersionedBalance, PortError>;

    /// Writes `new_balance` if the pool is still at `expected_version`
    ///
    /// Returns the new version, or `PortError::Conflict` if another writer
    /// got there first.
    async fn set_balance(
        &self,
        id: AccountId,
        pool: Pool,
        expected_version: u64,
        new_balance: Money,
    ) -> Result<u64, PortError>;
}

/// Ledger port: append-only
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    /// The only write
    async fn append_entry(&self, entry: LedgerEntry) -> Result<LedgerEntryId, PortError>;

    async fn get_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, PortError>;

    /// Newest first by creation time, insertion order as the tiebreak
    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>, PortError>;

    /// Sums of entries per pool for one account
    async fn pool_totals(&self, account_id: AccountId) -> Result<PoolTotals, PortError>;
}

/// Expense port
#[async_trait]
pub trait ExpenseStore: DomainPort + HealthCheckable {
    async fn record_expense(&self, expense: Expense) -> Result<ExpenseId, PortError>;

    async fn get_expense(&self, id: ExpenseId) -> Result<Expense, PortError>;

    /// Newest first by creation time, insertion order as the tiebreak
    async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, PortError>;

    /// Total and count, globally or for one account
    async fn summary(&self, account_id: Option<AccountId>) -> Result<ExpenseSummary, PortError>;

    /// Per-account totals, largest first
    async fn totals_by_account(&self) -> Result<Vec<AccountExpenseTotal>, PortError>;
}
