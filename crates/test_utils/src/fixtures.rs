//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for accounts, amounts and timestamps. Fixed values
//! are deterministic; the `random_*` helpers use `fake` for names.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{AccountId, Money};
use domain_ledger::{Account, NewAccount, Role, SalaryPeriod};
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn rupees_50() -> Money {
        Money::new(dec!(50.00))
    }

    pub fn rupees_100() -> Money {
        Money::new(dec!(100.00))
    }

    /// A typical monthly salary credit
    pub fn salary() -> Money {
        Money::new(dec!(45000.00))
    }

    /// An amount with paise, to catch rounding mistakes
    pub fn odd_paise() -> Money {
        Money::new(dec!(1234.57))
    }

    pub fn zero() -> Money {
        Money::zero()
    }
}

/// Fixture for timestamps and dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The day used by exact-date filter tests
    pub fn filter_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    pub fn filter_day_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    pub fn filter_day_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    pub fn filter_day_last_second() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap()
    }

    pub fn day_before() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap()
    }

    pub fn day_after() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap()
    }

    pub fn salary_period() -> SalaryPeriod {
        SalaryPeriod::new(2024, 3).unwrap()
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// A deterministic account id
    pub fn account_id() -> AccountId {
        AccountId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }
}

/// Fixture for account test data
pub struct AccountFixtures;

impl AccountFixtures {
    pub const ADMIN_NAME: &'static str = "Admin";
    pub const ADMIN_PIN: &'static str = "0000";
    pub const USER_PIN: &'static str = "1234";

    pub fn admin() -> Account {
        NewAccount {
            name: Self::ADMIN_NAME.to_string(),
            pin: Self::ADMIN_PIN.to_string(),
            role: Role::Admin,
            salary: None,
        }
        .into_account()
        .unwrap()
    }

    /// A user account with a generated, unique name
    pub fn user() -> Account {
        Self::named_user(&random_name())
    }

    pub fn named_user(name: &str) -> Account {
        NewAccount {
            name: name.to_string(),
            pin: Self::USER_PIN.to_string(),
            role: Role::User,
            salary: Some(MoneyFixtures::salary()),
        }
        .into_account()
        .unwrap()
    }
}

/// A generated person name, suffixed so repeated calls never collide
pub fn random_name() -> String {
    let name: String = Name().fake();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{} {}", name, &suffix[..6])
}
