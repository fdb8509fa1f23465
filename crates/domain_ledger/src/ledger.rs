//! Ledger entries: the append-only audit trail of balance deltas

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, CoreError, LedgerEntryId, Money, MoneyError};

use crate::account::Pool;

/// The calendar month a salary credit pays for
///
/// Held as the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SalaryPeriod(NaiveDate);

impl SalaryPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| CoreError::validation(format!("invalid month {}-{}", year, month)))
    }

    /// Normalizes any date to the month containing it
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for SalaryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for SalaryPeriod {
    type Err = CoreError;

    /// Accepts `YYYY-MM` or a full `YYYY-MM-DD` date
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::containing(date));
        }
        NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| CoreError::validation(format!("'{}' is not a month (YYYY-MM)", trimmed)))
    }
}

impl From<NaiveDate> for SalaryPeriod {
    fn from(date: NaiveDate) -> Self {
        Self::containing(date)
    }
}

impl<'de> Deserialize<'de> for SalaryPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One balance-affecting event, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    #[serde(rename = "user_id")]
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub pool: Pool,
    /// The signed delta, never the resulting balance
    pub amount: Money,
    #[serde(rename = "salary_month")]
    pub period: Option<SalaryPeriod>,
    pub description: Option<String>,
    /// Display name of the account owner when the entry was written
    #[serde(rename = "user_name")]
    pub actor_name: String,
    /// Admin who caused the entry, when different from the owner
    pub recorded_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn is_credit(&self) -> bool {
        self.amount.is_positive()
    }
}

/// Sum of credits per pool for one account
///
/// Display only. The running balance on the account stays authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolTotals {
    pub company: Money,
    pub personal: Money,
    pub salary: Money,
}

impl PoolTotals {
    pub fn add(&mut self, pool: Pool, amount: Money) -> Result<(), MoneyError> {
        let slot = match pool {
            Pool::Company => &mut self.company,
            Pool::Personal => &mut self.personal,
            Pool::Salary => &mut self.salary,
        };
        *slot = slot.checked_add(&amount)?;
        Ok(())
    }

    pub fn total(&self) -> Result<Money, MoneyError> {
        self.company.checked_add(&self.personal)?.checked_add(&self.salary)
    }
}
