//! Custom Test Assertions
//!
//! Assertion helpers for ledger types with clearer failure messages than
//! plain `assert_eq!`.

use core_kernel::{AccountId, Money};
use domain_ledger::{AccountStore, Expense, LedgerEntry, Pool};

/// Asserts the stored balance of one pool
pub async fn assert_balance(store: &dyn AccountStore, account_id: AccountId, pool: Pool, expected: Money) {
    let actual = store
        .get_balance(account_id, pool)
        .await
        .unwrap_or_else(|e| panic!("could not read {} balance of {}: {}", pool, account_id, e))
        .amount;
    assert_eq!(
        actual, expected,
        "{} balance of {}: expected {}, got {}",
        pool, account_id, expected, actual
    );
}

/// Asserts entries are newest first
pub fn assert_entries_newest_first(entries: &[LedgerEntry]) {
    for pair in entries.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "entries out of order: {} ({}) listed before {} ({})",
            pair[0].id,
            pair[0].created_at,
            pair[1].id,
            pair[1].created_at
        );
    }
}

/// Asserts expenses are newest first
pub fn assert_expenses_newest_first(expenses: &[Expense]) {
    for pair in expenses.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "expenses out of order: {} listed before {}",
            pair[0].id,
            pair[1].id
        );
    }
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}
