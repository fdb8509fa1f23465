//! Accounts, roles and balance pools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, CoreError, Money};

use crate::error::LedgerError;

/// Minimum number of digits in a PIN
pub const PIN_MIN_LEN: usize = 4;
/// Maximum number of digits in a PIN
pub const PIN_MAX_LEN: usize = 6;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(CoreError::validation(format!("unknown role '{}'", other))),
        }
    }
}

/// One of the three independent balance buckets on an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Company,
    Personal,
    Salary,
}

impl Pool {
    pub const ALL: [Pool; 3] = [Pool::Company, Pool::Personal, Pool::Salary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pool::Company => "company",
            Pool::Personal => "personal",
            Pool::Salary => "salary",
        }
    }

    /// Salary credits must carry the month they pay for
    pub fn requires_period(&self) -> bool {
        matches!(self, Pool::Salary)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pool {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "company" => Ok(Pool::Company),
            "personal" => Ok(Pool::Personal),
            "salary" => Ok(Pool::Salary),
            other => Err(CoreError::validation(format!("unknown pool '{}'", other))),
        }
    }
}

/// Running balances of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub company: Money,
    pub personal: Money,
    pub salary: Money,
}

impl Balances {
    pub fn get(&self, pool: Pool) -> Money {
        match pool {
            Pool::Company => self.company,
            Pool::Personal => self.personal,
            Pool::Salary => self.salary,
        }
    }

    pub fn set(&mut self, pool: Pool, amount: Money) {
        match pool {
            Pool::Company => self.company = amount,
            Pool::Personal => self.personal = amount,
            Pool::Salary => self.salary = amount,
        }
    }
}

/// A balance together with the version it was read at
///
/// Writers hand the version back to `AccountStore::set_balance`; the store
/// rejects the write if anyone else has written the pool in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedBalance {
    pub amount: Money,
    pub version: u64,
}

/// A user of the system
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub pin: String,
    pub role: Role,
    /// Fixed monthly salary figure, informational only
    pub salary: Option<Money>,
    pub balances: Balances,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Compares the PIN verbatim
    pub fn verify_pin(&self, pin: &str) -> bool {
        self.pin == pin
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn actor(&self) -> Actor {
        Actor {
            account_id: self.id,
            name: self.name.clone(),
            role: self.role,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pin", &"****")
            .field("role", &self.role)
            .field("salary", &self.salary)
            .field("balances", &self.balances)
            .field("created_at", &self.created_at)
            .finish()
    }
}

fn validate_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation("name is required"));
    }
    Ok(trimmed.to_string())
}

fn validate_pin(pin: &str) -> Result<(), LedgerError> {
    let len_ok = (PIN_MIN_LEN..=PIN_MAX_LEN).contains(&pin.len());
    if !len_ok || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::validation(format!(
            "PIN must be {}-{} digits",
            PIN_MIN_LEN, PIN_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_salary(salary: Option<Money>) -> Result<(), LedgerError> {
    match salary {
        Some(s) if s.is_negative() => Err(LedgerError::validation("salary cannot be negative")),
        _ => Ok(()),
    }
}

/// Input for creating an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub pin: String,
    pub role: Role,
    pub salary: Option<Money>,
}

impl NewAccount {
    /// Validates the input and turns it into an account with zero balances
    pub fn into_account(self) -> Result<Account, LedgerError> {
        let name = validate_name(&self.name)?;
        validate_pin(&self.pin)?;
        validate_salary(self.salary)?;

        Ok(Account {
            id: AccountId::new_v7(),
            name,
            pin: self.pin,
            role: self.role,
            salary: self.salary,
            balances: Balances::default(),
            created_at: Utc::now(),
        })
    }
}

/// Profile changes an admin may apply; balances are not reachable from here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub pin: Option<String>,
    pub role: Option<Role>,
    /// `Some(None)` clears the salary figure
    pub salary: Option<Option<Money>>,
}

impl ProfileUpdate {
    /// Validates the supplied fields, trimming the name
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name(name)?);
        }
        if let Some(pin) = &self.pin {
            validate_pin(pin)?;
        }
        if let Some(salary) = self.salary {
            validate_salary(salary)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.pin.is_none() && self.role.is_none() && self.salary.is_none()
    }

    /// Applies the update to an account in place
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(pin) = &self.pin {
            account.pin = pin.clone();
        }
        if let Some(role) = self.role {
            account.role = role;
        }
        if let Some(salary) = self.salary {
            account.salary = salary;
        }
    }
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub account_id: AccountId,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), LedgerError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(LedgerError::forbidden(format!(
                "{} is not an administrator",
                self.account_id
            )))
        }
    }
}

/// Point-in-time view of an account without its secret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub account_id: AccountId,
    pub name: String,
    pub role: Role,
    pub salary: Option<Money>,
    pub balances: Balances,
    pub taken_at: DateTime<Utc>,
}

impl From<&Account> for BalanceSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            name: account.name.clone(),
            role: account.role,
            salary: account.salary,
            balances: account.balances,
            taken_at: Utc::now(),
        }
    }
}

impl BalanceSnapshot {
    pub fn actor(&self) -> Actor {
        Actor {
            account_id: self.account_id,
            name: self.name.clone(),
            role: self.role,
        }
    }
}
