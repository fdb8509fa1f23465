//! Balance Mutator
//!
//! Applies one signed delta to one (account, pool) pair and records it in
//! the ledger. The sequence is:
//!
//! 1. read the pool balance and its version
//! 2. compute `balance + delta` (no clamping, negative results are allowed)
//! 3. compare-and-swap the new balance
//! 4. append a ledger entry carrying the signed delta
//!
//! Calls for the same (account, pool) are serialized by an in-process keyed
//! lock. Writers in other processes are caught by the compare-and-swap, in
//! which case steps 1-3 are redone up to `max_cas_attempts` times. Any other
//! store failure is returned as-is; nothing is retried.
//!
//! If step 3 fails nothing was written (`BalanceUpdateFailed`). If step 4
//! fails the balance has already moved and `LedgerAppendFailed` is returned;
//! the balance write is not rolled back.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{AccountId, ExpenseId, LedgerEntryId, Money};

use crate::account::{Actor, Pool};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::expense::{Expense, ExpenseCategory};
use crate::ledger::{LedgerEntry, SalaryPeriod};
use crate::ports::{AccountStore, ExpenseStore, LedgerStore};

/// Entries kept in the lock table before idle locks are pruned
const LOCK_TABLE_PRUNE_AT: usize = 1024;

type PoolKey = (AccountId, Pool);

/// One async mutex per (account, pool), created on demand
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<PoolKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    fn lock_for(&self, key: PoolKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks.len() >= LOCK_TABLE_PRUNE_AT {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(key).or_default().clone()
    }
}

/// A signed delta to apply to one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRequest {
    pub account_id: AccountId,
    pub pool: Pool,
    pub delta: Money,
    pub description: Option<String>,
    /// Required for the salary pool, dropped for the others
    pub period: Option<SalaryPeriod>,
    /// Admin who initiated the change, if any
    pub recorded_by: Option<AccountId>,
}

impl DeltaRequest {
    pub fn new(account_id: AccountId, pool: Pool, delta: Money) -> Self {
        Self {
            account_id,
            pool,
            delta,
            description: None,
            period: None,
            recorded_by: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_period(mut self, period: SalaryPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn recorded_by(mut self, admin: AccountId) -> Self {
        self.recorded_by = Some(admin);
        self
    }
}

/// Outcome of a successful `apply_delta`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDelta {
    pub previous_balance: Money,
    pub new_balance: Money,
    pub ledger_entry_id: LedgerEntryId,
    pub entry: LedgerEntry,
}

/// Input for an expense submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSubmission {
    pub category: ExpenseCategory,
    pub description: String,
    /// Must be positive; debited from the company pool
    pub amount: Money,
    pub receipt: Option<String>,
}

/// Outcome of a successful expense submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseReceipt {
    pub expense: Expense,
    pub ledger_entry: LedgerEntry,
    pub new_balance: Money,
}

/// Input for an admin fund addition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAddition {
    pub account_id: AccountId,
    pub pool: Pool,
    /// Must be positive
    pub amount: Money,
    pub description: Option<String>,
    pub period: Option<SalaryPeriod>,
}

fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Service that owns every balance change
#[derive(Clone)]
pub struct BalanceMutator {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    expenses: Arc<dyn ExpenseStore>,
    locks: Arc<KeyedLocks>,
    max_cas_attempts: u32,
}

impl BalanceMutator {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        expenses: Arc<dyn ExpenseStore>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            accounts,
            ledger,
            expenses,
            locks: Arc::new(KeyedLocks::default()),
            max_cas_attempts: config.max_cas_attempts.max(1),
        }
    }

    /// Applies one signed delta and appends its ledger entry
    #[instrument(
        skip(self, request),
        fields(account_id = %request.account_id, pool = %request.pool, delta = %request.delta)
    )]
    pub async fn apply_delta(&self, request: DeltaRequest) -> Result<AppliedDelta, LedgerError> {
        let DeltaRequest {
            account_id,
            pool,
            delta,
            description,
            period,
            recorded_by,
        } = request;

        if delta.is_zero() {
            return Err(LedgerError::validation("amount must not be zero"));
        }
        if !delta.is_within_entry_limit() {
            return Err(LedgerError::validation(format!(
                "amount exceeds the limit of {}",
                Money::max_entry()
            )));
        }
        let period = if pool.requires_period() {
            Some(period.ok_or_else(|| LedgerError::validation("salary month is required for salary credits"))?)
        } else {
            None
        };
        let description = clean_text(description);

        let lock = self.locks.lock_for((account_id, pool));
        let _guard = lock.lock().await;

        let account = self.accounts.get_account(account_id).await?;
        let (previous_balance, new_balance) = self.swap_balance(account_id, pool, delta).await?;

        let entry = LedgerEntry {
            id: LedgerEntryId::new_v7(),
            account_id,
            pool,
            amount: delta,
            period,
            description,
            actor_name: account.name,
            recorded_by,
            created_at: Utc::now(),
        };

        let ledger_entry_id = match self.ledger.append_entry(entry.clone()).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    %account_id,
                    %pool,
                    %delta,
                    %new_balance,
                    error = %e,
                    "Balance moved but ledger append failed; manual reconciliation required"
                );
                return Err(LedgerError::LedgerAppendFailed {
                    account_id,
                    pool,
                    delta,
                    new_balance,
                    reason: e.to_string(),
                });
            }
        };

        info!(%previous_balance, %new_balance, %ledger_entry_id, "Applied balance delta");

        Ok(AppliedDelta {
            previous_balance,
            new_balance,
            ledger_entry_id,
            entry,
        })
    }

    /// Read-compute-write with compare-and-swap, redone only on a lost race
    async fn swap_balance(
        &self,
        account_id: AccountId,
        pool: Pool,
        delta: Money,
    ) -> Result<(Money, Money), LedgerError> {
        for attempt in 1..=self.max_cas_attempts {
            let current = self.accounts.get_balance(account_id, pool).await?;
            let new_balance = current.amount.checked_add(&delta)?;

            match self
                .accounts
                .set_balance(account_id, pool, current.version, new_balance)
                .await
            {
                Ok(_) => return Ok((current.amount, new_balance)),
                Err(e) if e.is_conflict() => {
                    debug!(attempt, error = %e, "Balance changed underneath us, re-reading");
                }
                Err(e) => {
                    warn!(error = %e, "Balance write rejected");
                    return Err(LedgerError::BalanceUpdateFailed {
                        account_id,
                        pool,
                        reason: e.to_string(),
                    });
                }
            }
        }

        warn!(attempts = self.max_cas_attempts, "Gave up on contended balance");
        Err(LedgerError::BalanceUpdateFailed {
            account_id,
            pool,
            reason: format!(
                "balance kept changing concurrently after {} attempts",
                self.max_cas_attempts
            ),
        })
    }

    /// Debits the actor's company pool and records the expense
    #[instrument(skip(self, actor, submission), fields(account_id = %actor.account_id, amount = %submission.amount))]
    pub async fn submit_expense(
        &self,
        actor: &Actor,
        submission: ExpenseSubmission,
    ) -> Result<ExpenseReceipt, LedgerError> {
        if !submission.amount.is_positive() {
            return Err(LedgerError::validation("expense amount must be positive"));
        }
        let description = clean_text(Some(submission.description))
            .ok_or_else(|| LedgerError::validation("description is required"))?;
        let receipt = clean_text(submission.receipt);

        let delta = -submission.amount;
        let applied = self
            .apply_delta(
                DeltaRequest::new(actor.account_id, Pool::Company, delta)
                    .with_description(description.clone()),
            )
            .await?;

        let expense = Expense {
            id: ExpenseId::new_v7(),
            account_id: actor.account_id,
            ledger_entry_id: applied.ledger_entry_id,
            category: submission.category,
            description,
            amount: submission.amount,
            receipt,
            account_name: applied.entry.actor_name.clone(),
            created_at: applied.entry.created_at,
        };

        if let Err(e) = self.expenses.record_expense(expense.clone()).await {
            error!(
                ledger_entry_id = %applied.ledger_entry_id,
                new_balance = %applied.new_balance,
                error = %e,
                "Company balance debited but expense record failed"
            );
            return Err(LedgerError::LedgerAppendFailed {
                account_id: actor.account_id,
                pool: Pool::Company,
                delta,
                new_balance: applied.new_balance,
                reason: e.to_string(),
            });
        }

        info!(expense_id = %expense.id, category = %expense.category, "Expense submitted");

        Ok(ExpenseReceipt {
            expense,
            ledger_entry: applied.entry,
            new_balance: applied.new_balance,
        })
    }

    /// Credits a pool on behalf of an administrator
    #[instrument(skip(self, actor, addition), fields(admin = %actor.account_id, account_id = %addition.account_id, pool = %addition.pool))]
    pub async fn add_funds(&self, actor: &Actor, addition: FundAddition) -> Result<AppliedDelta, LedgerError> {
        actor.require_admin()?;
        if !addition.amount.is_positive() {
            return Err(LedgerError::validation("fund amount must be positive"));
        }

        let mut request = DeltaRequest::new(addition.account_id, addition.pool, addition.amount);
        request.description = addition.description;
        request.period = addition.period;
        if actor.account_id != addition.account_id {
            request.recorded_by = Some(actor.account_id);
        }

        self.apply_delta(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, NewAccount, Role};
    use crate::memory::{MemoryAccountStore, MemoryExpenseStore, MemoryLedgerStore};
    use rust_decimal_macros::dec;

    fn account(role: Role) -> Account {
        NewAccount {
            name: format!("{}-{}", role, AccountId::new()),
            pin: "4321".to_string(),
            role,
            salary: None,
        }
        .into_account()
        .unwrap()
    }

    async fn setup(accounts: Vec<Account>) -> (BalanceMutator, Arc<MemoryAccountStore>, Arc<MemoryLedgerStore>, Arc<MemoryExpenseStore>) {
        let store = Arc::new(MemoryAccountStore::with_accounts(accounts).await);
        let ledger = Arc::new(MemoryLedgerStore::new());
        let expenses = Arc::new(MemoryExpenseStore::new());
        let mutator = BalanceMutator::new(
            store.clone(),
            ledger.clone(),
            expenses.clone(),
            &LedgerConfig::default(),
        );
        (mutator, store, ledger, expenses)
    }

    #[tokio::test]
    async fn test_zero_delta_rejected() {
        let acc = account(Role::User);
        let (mutator, _, ledger, _) = setup(vec![acc.clone()]).await;
        let err = mutator
            .apply_delta(DeltaRequest::new(acc.id, Pool::Company, Money::zero()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let (mutator, _, _, _) = setup(vec![]).await;
        let err = mutator
            .apply_delta(DeltaRequest::new(AccountId::new(), Pool::Personal, Money::new(dec!(5))))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_period_dropped_for_non_salary_pool() {
        let acc = account(Role::User);
        let (mutator, _, _, _) = setup(vec![acc.clone()]).await;
        let applied = mutator
            .apply_delta(
                DeltaRequest::new(acc.id, Pool::Personal, Money::new(dec!(5)))
                    .with_period(SalaryPeriod::new(2024, 1).unwrap()),
            )
            .await
            .unwrap();
        assert!(applied.entry.period.is_none());
    }

    #[tokio::test]
    async fn test_blank_description_stored_as_none() {
        let acc = account(Role::User);
        let (mutator, _, _, _) = setup(vec![acc.clone()]).await;
        let applied = mutator
            .apply_delta(DeltaRequest::new(acc.id, Pool::Personal, Money::new(dec!(5))).with_description("  "))
            .await
            .unwrap();
        assert!(applied.entry.description.is_none());
        assert_eq!(applied.entry.actor_name, acc.name);
    }

    #[tokio::test]
    async fn test_forced_conflicts_exhaust_attempts() {
        let acc = account(Role::User);
        let (mutator, store, ledger, _) = setup(vec![acc.clone()]).await;
        store.force_conflicts(true);

        let err = mutator
            .apply_delta(DeltaRequest::new(acc.id, Pool::Company, Money::new(dec!(1))))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceUpdateFailed { .. }));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_expense_record_failure_is_inconsistency() {
        let acc = account(Role::User);
        let (mutator, store, ledger, expenses) = setup(vec![acc.clone()]).await;
        expenses.fail_records(true);

        let err = mutator
            .submit_expense(
                &acc.actor(),
                ExpenseSubmission {
                    category: ExpenseCategory::Meals,
                    description: "team lunch".to_string(),
                    amount: Money::new(dec!(30)),
                    receipt: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_inconsistent());
        assert_eq!(ledger.len().await, 1);
        let balance = store.get_balance(acc.id, Pool::Company).await.unwrap();
        assert_eq!(balance.amount, Money::new(dec!(-30)));
    }

    #[tokio::test]
    async fn test_add_funds_records_admin() {
        let admin = account(Role::Admin);
        let user = account(Role::User);
        let (mutator, _, _, _) = setup(vec![admin.clone(), user.clone()]).await;

        let applied = mutator
            .add_funds(
                &admin.actor(),
                FundAddition {
                    account_id: user.id,
                    pool: Pool::Company,
                    amount: Money::new(dec!(500)),
                    description: Some("float".to_string()),
                    period: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(applied.entry.recorded_by, Some(admin.id));
        assert_eq!(applied.new_balance, Money::new(dec!(500)));
    }
}
