//! Core Kernel - Foundational types for the expense ledger
//!
//! This crate provides the building blocks shared by every other crate:
//! - `Money` with precise decimal arithmetic at currency precision
//! - Strongly-typed identifiers for accounts, ledger entries and expenses
//! - The port error type and marker traits used by storage adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, MoneyError, CURRENCY_DECIMAL_PLACES, CURRENCY_SYMBOL, MAX_ENTRY_MINOR};
pub use identifiers::{AccountId, LedgerEntryId, ExpenseId};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
