//! Filters for ledger and expense listings
//!
//! Exact-day matching is done in a configurable timezone: a date filter
//! selects every record whose creation instant falls inside that local
//! calendar day, whatever the time of day.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use core_kernel::AccountId;

use crate::account::Pool;
use crate::expense::{Expense, ExpenseCategory};
use crate::ledger::LedgerEntry;

/// UTC bounds `[start, end)` of a local calendar day
pub fn day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(date, tz);
    let end = date
        .checked_add_days(Days::new(1))
        .map(|next| local_midnight(next, tz))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    // Midnight can be skipped by a DST jump; take the earliest valid instant
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty())
}

/// Filter for ledger entry listings
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerFilter {
    pub account_id: Option<AccountId>,
    pub pool: Option<Pool>,
    pub date: Option<NaiveDate>,
    /// Lowercased search term over description and actor name
    pub text: Option<String>,
    pub timezone: Tz,
}

impl Default for LedgerFilter {
    fn default() -> Self {
        Self {
            account_id: None,
            pool: None,
            date: None,
            text: None,
            timezone: Tz::UTC,
        }
    }
}

impl LedgerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_pool(mut self, pool: Pool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = normalize_text(Some(text.into()));
        self
    }

    pub fn in_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn day_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(|d| day_bounds(d, self.timezone))
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if self.account_id.is_some_and(|id| id != entry.account_id) {
            return false;
        }
        if self.pool.is_some_and(|p| p != entry.pool) {
            return false;
        }
        if let Some((start, end)) = self.day_bounds() {
            if entry.created_at < start || entry.created_at >= end {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let in_description = entry
                .description
                .as_deref()
                .is_some_and(|d| contains_ci(d, text));
            if !in_description && !contains_ci(&entry.actor_name, text) {
                return false;
            }
        }
        true
    }
}

/// Filter for expense listings
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseFilter {
    pub account_id: Option<AccountId>,
    pub category: Option<ExpenseCategory>,
    pub date: Option<NaiveDate>,
    /// Lowercased search term over description and owner name
    pub text: Option<String>,
    pub timezone: Tz,
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        Self {
            account_id: None,
            category: None,
            date: None,
            text: None,
            timezone: Tz::UTC,
        }
    }
}

impl ExpenseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = normalize_text(Some(text.into()));
        self
    }

    pub fn in_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn day_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(|d| day_bounds(d, self.timezone))
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if self.account_id.is_some_and(|id| id != expense.account_id) {
            return false;
        }
        if self.category.is_some_and(|c| c != expense.category) {
            return false;
        }
        if let Some((start, end)) = self.day_bounds() {
            if expense.created_at < start || expense.created_at >= end {
                return false;
            }
        }
        if let Some(text) = &self.text {
            if !contains_ci(&expense.description, text) && !contains_ci(&expense.account_name, text) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::{LedgerEntryId, Money};
    use rust_decimal_macros::dec;

    fn entry_at(created_at: DateTime<Utc>, description: &str) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new_v7(),
            account_id: AccountId::new(),
            pool: Pool::Company,
            amount: Money::new(dec!(1)),
            period: None,
            description: Some(description.to_string()),
            actor_name: "Kiran Rao".to_string(),
            recorded_by: None,
            created_at,
        }
    }

    #[test]
    fn test_day_bounds_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_bounds(date, Tz::UTC);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_day_bounds_in_kolkata() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, _) = day_bounds(date, chrono_tz::Asia::Kolkata);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 14, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_date_filter_ignores_time_of_day() {
        let filter = LedgerFilter::new().on_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(filter.matches(&entry_at(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(), "a")));
        assert!(filter.matches(&entry_at(Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap(), "b")));
        assert!(!filter.matches(&entry_at(Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap(), "c")));
        assert!(!filter.matches(&entry_at(Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap(), "d")));
    }

    #[test]
    fn test_text_filter_is_case_insensitive_over_description_and_name() {
        let entry = entry_at(Utc::now(), "Diesel for generator");
        assert!(LedgerFilter::new().with_text("DIESEL").matches(&entry));
        assert!(LedgerFilter::new().with_text("rao").matches(&entry));
        assert!(!LedgerFilter::new().with_text("petrol").matches(&entry));
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let filter = LedgerFilter::new().with_text("   ");
        assert!(filter.text.is_none());
    }

    #[test]
    fn test_pool_and_account_filters() {
        let entry = entry_at(Utc::now(), "x");
        assert!(!LedgerFilter::new().with_pool(Pool::Salary).matches(&entry));
        assert!(LedgerFilter::new().with_pool(Pool::Company).matches(&entry));
        assert!(!LedgerFilter::new().for_account(AccountId::new()).matches(&entry));
        assert!(LedgerFilter::new().for_account(entry.account_id).matches(&entry));
    }
}
