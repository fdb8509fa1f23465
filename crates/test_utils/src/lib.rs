//! Test Utilities Crate
//!
//! Shared test infrastructure for the expense ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for accounts, amounts and dates
//! - `builders`: Builders for ledger entries and expenses
//! - `harness`: In-memory stores wired into the ledger services
//! - `database`: Postgres testcontainer management
//! - `assertions`: Assertion helpers for ledger types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
