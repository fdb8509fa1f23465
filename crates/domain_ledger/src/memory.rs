//! In-memory store adapters
//!
//! Used by unit tests, the HTTP tests and local demos. Each store can be told
//! to fail its write path so partial-failure handling can be exercised.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, ExpenseId, HealthCheckResult, HealthCheckable,
    LedgerEntryId, Money, MoneyError, PortError,
};

use crate::account::{Account, Pool, ProfileUpdate, VersionedBalance};
use crate::expense::{AccountExpenseTotal, Expense, ExpenseSummary};
use crate::filters::{ExpenseFilter, LedgerFilter};
use crate::ledger::{LedgerEntry, PoolTotals};
use crate::pagination::{Page, PageRequest};
use crate::ports::{AccountStore, ExpenseStore, LedgerStore};

fn healthy(adapter_id: &str) -> HealthCheckResult {
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status: AdapterHealth::Healthy,
        latency_ms: 0,
        message: Some("In-memory adapter always healthy".to_string()),
        checked_at: Utc::now(),
    }
}

fn overflow(err: MoneyError) -> PortError {
    PortError::internal(format!("aggregate out of range: {}", err))
}

fn pool_index(pool: Pool) -> usize {
    match pool {
        Pool::Company => 0,
        Pool::Personal => 1,
        Pool::Salary => 2,
    }
}

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    versions: [u64; 3],
}

/// In-memory Account Store with per-pool versions
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, StoredAccount>>>,
    read_latency: Option<Duration>,
    fail_balance_writes: AtomicBool,
    force_conflicts: AtomicBool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store
    pub async fn with_accounts(accounts: Vec<Account>) -> Self {
        let store = Self::new();
        {
            let mut map = store.accounts.write().await;
            for account in accounts {
                map.insert(account.id, StoredAccount { account, versions: [0; 3] });
            }
        }
        store
    }

    /// Delays every balance read, widening the read/write window
    pub fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = Some(latency);
        self
    }

    /// Makes every `set_balance` fail with an internal error
    pub fn fail_balance_writes(&self, fail: bool) {
        self.fail_balance_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every `set_balance` report a lost compare-and-swap
    pub fn force_conflicts(&self, conflict: bool) {
        self.force_conflicts.store(conflict, Ordering::SeqCst);
    }
}

impl DomainPort for MemoryAccountStore {}

#[async_trait]
impl HealthCheckable for MemoryAccountStore {
    async fn health_check(&self) -> HealthCheckResult {
        healthy("memory-account-store")
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert_account(&self, account: Account) -> Result<Account, PortError> {
        let mut map = self.accounts.write().await;
        if map.values().any(|s| s.account.name == account.name) {
            return Err(PortError::validation_field(
                format!("an account named '{}' already exists", account.name),
                "name",
            ));
        }
        map.insert(
            account.id,
            StoredAccount {
                account: account.clone(),
                versions: [0; 3],
            },
        );
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError> {
        self.accounts
            .read()
            .await
            .get(&id)
            .map(|s| s.account.clone())
            .ok_or_else(|| PortError::not_found("Account", id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, PortError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|s| s.account.name == name)
            .map(|s| s.account.clone()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .read()
            .await
            .values()
            .map(|s| s.account.clone())
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    async fn count_accounts(&self) -> Result<u64, PortError> {
        Ok(self.accounts.read().await.len() as u64)
    }

    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, PortError> {
        let mut map = self.accounts.write().await;
        if let Some(name) = &update.name {
            if map.values().any(|s| s.account.id != id && &s.account.name == name) {
                return Err(PortError::validation_field(
                    format!("an account named '{}' already exists", name),
                    "name",
                ));
            }
        }
        let stored = map.get_mut(&id).ok_or_else(|| PortError::not_found("Account", id))?;
        update.apply_to(&mut stored.account);
        Ok(stored.account.clone())
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), PortError> {
        self.accounts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("Account", id))
    }

    async fn get_balance(&self, id: AccountId, pool: Pool) -> Result<VersionedBalance, PortError> {
        let balance = {
            let map = self.accounts.read().await;
            let stored = map.get(&id).ok_or_else(|| PortError::not_found("Account", id))?;
            VersionedBalance {
                amount: stored.account.balances.get(pool),
                version: stored.versions[pool_index(pool)],
            }
        };
        if let Some(latency) = self.read_latency {
            tokio::time::sleep(latency).await;
        }
        Ok(balance)
    }

    async fn set_balance(
        &self,
        id: AccountId,
        pool: Pool,
        expected_version: u64,
        new_balance: Money,
    ) -> Result<u64, PortError> {
        if self.fail_balance_writes.load(Ordering::SeqCst) {
            return Err(PortError::internal("balance write rejected"));
        }
        if self.force_conflicts.load(Ordering::SeqCst) {
            return Err(PortError::conflict(format!("{} {} version moved", id, pool)));
        }

        let mut map = self.accounts.write().await;
        let stored = map.get_mut(&id).ok_or_else(|| PortError::not_found("Account", id))?;
        let slot = pool_index(pool);
        if stored.versions[slot] != expected_version {
            return Err(PortError::conflict(format!(
                "{} {} is at version {}, expected {}",
                id, pool, stored.versions[slot], expected_version
            )));
        }
        stored.account.balances.set(pool, new_balance);
        stored.versions[slot] += 1;
        Ok(stored.versions[slot])
    }
}

/// Newest first; later insertion wins a timestamp tie
fn newest_first<T>(items: &[T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        created_at(&items[b])
            .cmp(&created_at(&items[a]))
            .then(b.cmp(&a))
    });
    order
}

/// In-memory append-only ledger
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
    fail_appends: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `append_entry` fail
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of entries written so far
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl DomainPort for MemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for MemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        healthy("memory-ledger-store")
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn append_entry(&self, entry: LedgerEntry) -> Result<LedgerEntryId, PortError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(PortError::internal("ledger append rejected"));
        }
        let id = entry.id;
        self.entries.write().await.push(entry);
        Ok(id)
    }

    async fn get_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, PortError> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("LedgerEntry", id))
    }

    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>, PortError> {
        let entries = self.entries.read().await;
        let ordered: Vec<LedgerEntry> = newest_first(&entries, |e| e.created_at)
            .into_iter()
            .map(|i| &entries[i])
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        Ok(page.slice(&ordered))
    }

    async fn pool_totals(&self, account_id: AccountId) -> Result<PoolTotals, PortError> {
        let mut totals = PoolTotals::default();
        for entry in self.entries.read().await.iter().filter(|e| e.account_id == account_id) {
            totals.add(entry.pool, entry.amount).map_err(overflow)?;
        }
        Ok(totals)
    }
}

/// In-memory expense collection
#[derive(Debug, Default)]
pub struct MemoryExpenseStore {
    expenses: Arc<RwLock<Vec<Expense>>>,
    fail_records: AtomicBool,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `record_expense` fail
    pub fn fail_records(&self, fail: bool) {
        self.fail_records.store(fail, Ordering::SeqCst);
    }
}

impl DomainPort for MemoryExpenseStore {}

#[async_trait]
impl HealthCheckable for MemoryExpenseStore {
    async fn health_check(&self) -> HealthCheckResult {
        healthy("memory-expense-store")
    }
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn record_expense(&self, expense: Expense) -> Result<ExpenseId, PortError> {
        if self.fail_records.load(Ordering::SeqCst) {
            return Err(PortError::internal("expense insert rejected"));
        }
        let id = expense.id;
        self.expenses.write().await.push(expense);
        Ok(id)
    }

    async fn get_expense(&self, id: ExpenseId) -> Result<Expense, PortError> {
        self.expenses
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Expense", id))
    }

    async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, PortError> {
        let expenses = self.expenses.read().await;
        let ordered: Vec<Expense> = newest_first(&expenses, |e| e.created_at)
            .into_iter()
            .map(|i| &expenses[i])
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        Ok(page.slice(&ordered))
    }

    async fn summary(&self, account_id: Option<AccountId>) -> Result<ExpenseSummary, PortError> {
        let expenses = self.expenses.read().await;
        ExpenseSummary::from_expenses(
            expenses
                .iter()
                .filter(|e| account_id.map_or(true, |id| e.account_id == id)),
        )
        .map_err(overflow)
    }

    async fn totals_by_account(&self) -> Result<Vec<AccountExpenseTotal>, PortError> {
        let expenses = self.expenses.read().await;
        let mut totals: HashMap<AccountId, AccountExpenseTotal> = HashMap::new();
        // Newest first, so each row keeps the most recent owner name
        for expense in newest_first(&expenses, |e| e.created_at).into_iter().map(|i| &expenses[i]) {
            let row = totals.entry(expense.account_id).or_insert_with(|| AccountExpenseTotal {
                account_id: expense.account_id,
                account_name: expense.account_name.clone(),
                total: Money::zero(),
                count: 0,
            });
            row.total = row.total.checked_add(&expense.amount).map_err(overflow)?;
            row.count += 1;
        }
        let mut rows: Vec<AccountExpenseTotal> = totals.into_values().collect();
        rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.account_id.as_uuid().cmp(b.account_id.as_uuid()))
        });
        Ok(rows)
    }
}
