//! In-memory ledger harness
//!
//! Wires the in-memory stores into the ledger services so tests can drive
//! the whole core without a database.

use std::sync::Arc;

use core_kernel::{AccountId, Money};
use domain_ledger::{
    Account, AccountDirectory, AccountStore, BalanceMutator, DeltaRequest, LedgerConfig,
    LedgerQueries, MemoryAccountStore, MemoryExpenseStore, MemoryLedgerStore, Pool,
};

use crate::fixtures::AccountFixtures;

pub struct TestLedger {
    pub accounts: Arc<MemoryAccountStore>,
    pub ledger: Arc<MemoryLedgerStore>,
    pub expenses: Arc<MemoryExpenseStore>,
    pub mutator: BalanceMutator,
    pub queries: LedgerQueries,
    pub directory: AccountDirectory,
    pub config: LedgerConfig,
}

impl TestLedger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self::from_stores(MemoryAccountStore::new(), config)
    }

    /// Builds the services over a preconfigured account store
    pub fn from_stores(accounts: MemoryAccountStore, config: LedgerConfig) -> Self {
        let accounts = Arc::new(accounts);
        let ledger = Arc::new(MemoryLedgerStore::new());
        let expenses = Arc::new(MemoryExpenseStore::new());
        let mutator = BalanceMutator::new(accounts.clone(), ledger.clone(), expenses.clone(), &config);
        let queries = LedgerQueries::new(accounts.clone(), ledger.clone(), expenses.clone(), config.clone());
        let directory = AccountDirectory::new(accounts.clone());
        Self {
            accounts,
            ledger,
            expenses,
            mutator,
            queries,
            directory,
            config,
        }
    }

    /// A second mutator over the same stores but with its own lock table,
    /// standing in for another process
    pub fn independent_mutator(&self) -> BalanceMutator {
        BalanceMutator::new(
            self.accounts.clone(),
            self.ledger.clone(),
            self.expenses.clone(),
            &self.config,
        )
    }

    pub async fn add_account(&self, account: Account) -> Account {
        self.accounts.insert_account(account).await.unwrap()
    }

    pub async fn add_admin(&self) -> Account {
        self.add_account(AccountFixtures::admin()).await
    }

    pub async fn add_user(&self) -> Account {
        self.add_account(AccountFixtures::user()).await
    }

    /// Sets a starting balance through the mutator
    pub async fn seed_balance(&self, account_id: AccountId, pool: Pool, amount: Money) {
        if amount.is_zero() {
            return;
        }
        let mut request = DeltaRequest::new(account_id, pool, amount).with_description("opening balance");
        if pool == Pool::Salary {
            request = request.with_period(crate::fixtures::TemporalFixtures::salary_period());
        }
        self.mutator.apply_delta(request).await.unwrap();
    }

    pub async fn balance(&self, account_id: AccountId, pool: Pool) -> Money {
        self.accounts.get_balance(account_id, pool).await.unwrap().amount
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}
