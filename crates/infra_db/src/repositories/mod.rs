//! Repository implementations
//!
//! Repositories own the SQL. They speak plain database types (`Uuid`,
//! `Decimal`, text enums) and leave the mapping to domain types to the
//! adapters. Queries are built at runtime; filters go through
//! [`sqlx::QueryBuilder`] so every value is bound, never interpolated.

pub mod accounts;
pub mod expenses;
pub mod ledger;

pub use accounts::{AccountRepository, BalanceWrite, NewUser, PoolColumns, UserProfileUpdate, UserRow};
pub use expenses::{AccountTotalRow, ExpenseQuery, ExpenseRepository, ExpenseRow};
pub use ledger::{EntryQuery, EntryRow, LedgerRepository};

/// Turns free text into an `ILIKE` substring pattern
///
/// `%`, `_` and `\` in the input match literally.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
