//! Test Data Builders
//!
//! Builders for ledger entries and expenses with sensible defaults, so tests
//! only name the fields they care about. Entries built here bypass the
//! Balance Mutator and are meant for seeding query tests.

use chrono::{DateTime, Utc};
use core_kernel::{AccountId, ExpenseId, LedgerEntryId, Money};
use domain_ledger::{Expense, ExpenseCategory, LedgerEntry, Pool, SalaryPeriod};

use crate::fixtures::MoneyFixtures;

/// Builder for ledger entries
pub struct TestLedgerEntryBuilder {
    account_id: AccountId,
    pool: Pool,
    amount: Money,
    period: Option<SalaryPeriod>,
    description: Option<String>,
    actor_name: String,
    created_at: DateTime<Utc>,
}

impl Default for TestLedgerEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedgerEntryBuilder {
    pub fn new() -> Self {
        Self {
            account_id: AccountId::new(),
            pool: Pool::Company,
            amount: MoneyFixtures::rupees_100(),
            period: None,
            description: Some("seeded entry".to_string()),
            actor_name: "Seed User".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_account(mut self, account_id: AccountId, name: impl Into<String>) -> Self {
        self.account_id = account_id;
        self.actor_name = name.into();
        self
    }

    pub fn with_pool(mut self, pool: Pool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_period(mut self, period: SalaryPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn build(self) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new_v7(),
            account_id: self.account_id,
            pool: self.pool,
            amount: self.amount,
            period: self.period,
            description: self.description,
            actor_name: self.actor_name,
            recorded_by: None,
            created_at: self.created_at,
        }
    }
}

/// Builder for expenses
pub struct TestExpenseBuilder {
    account_id: AccountId,
    account_name: String,
    category: ExpenseCategory,
    description: String,
    amount: Money,
    receipt: Option<String>,
    created_at: DateTime<Utc>,
}

impl Default for TestExpenseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestExpenseBuilder {
    pub fn new() -> Self {
        Self {
            account_id: AccountId::new(),
            account_name: "Seed User".to_string(),
            category: ExpenseCategory::Miscellaneous,
            description: "seeded expense".to_string(),
            amount: MoneyFixtures::rupees_50(),
            receipt: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_account(mut self, account_id: AccountId, name: impl Into<String>) -> Self {
        self.account_id = account_id;
        self.account_name = name.into();
        self
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn build(self) -> Expense {
        Expense {
            id: ExpenseId::new_v7(),
            account_id: self.account_id,
            ledger_entry_id: LedgerEntryId::new_v7(),
            category: self.category,
            description: self.description,
            amount: self.amount,
            receipt: self.receipt,
            account_name: self.account_name,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_builder_defaults() {
        let entry = TestLedgerEntryBuilder::new().build();
        assert_eq!(entry.pool, Pool::Company);
        assert!(entry.period.is_none());
    }

    #[test]
    fn test_expense_builder_overrides() {
        let owner = AccountId::new();
        let expense = TestExpenseBuilder::new()
            .with_account(owner, "Hari")
            .with_category(ExpenseCategory::Travel)
            .with_amount(Money::new(dec!(320)))
            .build();
        assert_eq!(expense.account_id, owner);
        assert_eq!(expense.account_name, "Hari");
        assert_eq!(expense.category, ExpenseCategory::Travel);
        assert_eq!(expense.amount, Money::new(dec!(320)));
    }
}
