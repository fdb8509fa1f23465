//! Property-Based Test Generators
//!
//! Proptest strategies for ledger amounts, pools and categories.

use core_kernel::Money;
use domain_ledger::{ExpenseCategory, Pool};
use proptest::prelude::*;

/// Any amount in minor units, within a realistic range
pub fn amount_minor_strategy() -> impl Strategy<Value = i64> {
    -1_000_000_000i64..1_000_000_000i64
}

/// Positive money up to ten million
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (1i64..1_000_000_000i64).prop_map(Money::from_minor)
}

/// Money that may be negative or zero
pub fn money_strategy() -> impl Strategy<Value = Money> {
    amount_minor_strategy().prop_map(Money::from_minor)
}

/// A signed, non-zero delta
pub fn nonzero_delta_strategy() -> impl Strategy<Value = Money> {
    amount_minor_strategy()
        .prop_filter("delta must be non-zero", |m| *m != 0)
        .prop_map(Money::from_minor)
}

pub fn pool_strategy() -> impl Strategy<Value = Pool> {
    prop::sample::select(Pool::ALL.to_vec())
}

pub fn category_strategy() -> impl Strategy<Value = ExpenseCategory> {
    prop::sample::select(ExpenseCategory::ALL.to_vec())
}
