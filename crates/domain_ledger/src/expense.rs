//! Expenses submitted against the company pool

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, CoreError, ExpenseId, LedgerEntryId, Money, MoneyError};

/// Fixed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseCategory {
    OfficeSupplies,
    Travel,
    Meals,
    Equipment,
    Software,
    Utilities,
    SiteWork,
    Bill,
    Miscellaneous,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 9] = [
        ExpenseCategory::OfficeSupplies,
        ExpenseCategory::Travel,
        ExpenseCategory::Meals,
        ExpenseCategory::Equipment,
        ExpenseCategory::Software,
        ExpenseCategory::Utilities,
        ExpenseCategory::SiteWork,
        ExpenseCategory::Bill,
        ExpenseCategory::Miscellaneous,
    ];

    /// Human-readable label, also the stored form
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::OfficeSupplies => "Office Supplies",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Meals => "Meals",
            ExpenseCategory::Equipment => "Equipment",
            ExpenseCategory::Software => "Software",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::SiteWork => "Site Work",
            ExpenseCategory::Bill => "Bill",
            ExpenseCategory::Miscellaneous => "Miscellaneous",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpenseCategory {
    type Err = CoreError;

    /// Accepts the label (`"Site Work"`) or snake_case (`"site_work"`), any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', " ");
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| CoreError::validation(format!("unknown expense category '{}'", s.trim())))
    }
}

impl Serialize for ExpenseCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ExpenseCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    #[serde(rename = "user_id")]
    pub account_id: AccountId,
    /// The company-pool debit this expense produced
    pub ledger_entry_id: LedgerEntryId,
    pub category: ExpenseCategory,
    pub description: String,
    /// Positive amount that was debited
    pub amount: Money,
    /// Receipt image reference
    #[serde(rename = "image", alias = "photo_url", default)]
    pub receipt: Option<String>,
    #[serde(rename = "user_name")]
    pub account_name: String,
    pub created_at: DateTime<Utc>,
}

/// Total amount and count over a set of expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total: Money,
    pub count: u64,
}

impl ExpenseSummary {
    pub fn from_expenses<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Result<Self, MoneyError> {
        expenses.into_iter().try_fold(Self::default(), |acc, e| {
            Ok(Self {
                total: acc.total.checked_add(&e.amount)?,
                count: acc.count + 1,
            })
        })
    }
}

/// Expense total for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountExpenseTotal {
    pub account_id: AccountId,
    pub account_name: String,
    pub total: Money,
    pub count: u64,
}
