//! Ledger Domain
//!
//! Balance-and-ledger consistency for the expense tracker:
//! - Account Store, Ledger and Expense ports
//! - The Balance Mutator, the only code path that changes a balance
//! - Read-side queries, the account directory and the session refresher

pub mod account;
pub mod config;
pub mod directory;
pub mod error;
pub mod expense;
pub mod filters;
pub mod ledger;
pub mod mutator;
pub mod pagination;
pub mod ports;
pub mod query;
pub mod session;

#[cfg(any(test, feature = "mock"))]
pub mod memory;

pub use account::{
    Account, Actor, BalanceSnapshot, Balances, NewAccount, Pool, ProfileUpdate, Role,
    VersionedBalance,
};
pub use config::LedgerConfig;
pub use directory::AccountDirectory;
pub use error::LedgerError;
pub use expense::{AccountExpenseTotal, Expense, ExpenseCategory, ExpenseSummary};
pub use filters::{ExpenseFilter, LedgerFilter};
pub use ledger::{LedgerEntry, PoolTotals, SalaryPeriod};
pub use mutator::{
    AppliedDelta, BalanceMutator, DeltaRequest, ExpenseReceipt, ExpenseSubmission, FundAddition,
};
pub use pagination::{Page, PageRequest};
pub use ports::{AccountStore, ExpenseStore, LedgerStore};
pub use query::{Dashboard, ExpenseSearch, LedgerQueries, Scope, TransactionSearch};
pub use session::{
    BalanceRefresher, FileSessionStore, MemorySessionStore, RefreshHandle, SessionContext,
    SessionError, SessionStore, SharedSession,
};

#[cfg(any(test, feature = "mock"))]
pub use memory::{MemoryAccountStore, MemoryExpenseStore, MemoryLedgerStore};
