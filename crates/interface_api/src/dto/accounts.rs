//! Account DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use core_kernel::{AccountId, Money};
use domain_ledger::{Account, Balances, NewAccount, ProfileUpdate, Role};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 4, max = 6))]
    pub pin: String,
    pub role: Role,
    pub salary: Option<Decimal>,
}

impl From<CreateAccountRequest> for NewAccount {
    fn from(request: CreateAccountRequest) -> Self {
        NewAccount {
            name: request.name,
            pin: request.pin,
            role: request.role,
            salary: request.salary.map(Money::new),
        }
    }
}

/// Profile changes; absent fields are left alone and `"salary": null` clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 4, max = 6))]
    pub pin: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub salary: Option<Option<Decimal>>,
}

fn present_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error> {
    Option::<Decimal>::deserialize(deserializer).map(Some)
}

impl From<UpdateAccountRequest> for ProfileUpdate {
    fn from(request: UpdateAccountRequest) -> Self {
        ProfileUpdate {
            name: request.name,
            pin: request.pin,
            role: request.role,
            salary: request.salary.map(|s| s.map(Money::new)),
        }
    }
}

/// An account without its PIN
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub name: String,
    pub role: Role,
    pub salary: Option<Money>,
    pub balances: Balances,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            role: account.role,
            salary: account.salary,
            balances: account.balances,
            created_at: account.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_salary_absent_null_and_present() {
        let absent: UpdateAccountRequest = serde_json::from_str(r#"{"name":"Ravi"}"#).unwrap();
        assert_eq!(absent.salary, None);

        let cleared: UpdateAccountRequest = serde_json::from_str(r#"{"salary":null}"#).unwrap();
        assert_eq!(cleared.salary, Some(None));

        let set: UpdateAccountRequest = serde_json::from_str(r#"{"salary":"52000"}"#).unwrap();
        assert_eq!(set.salary, Some(Some(dec!(52000))));
    }

    #[test]
    fn test_response_omits_pin() {
        let account = NewAccount {
            name: "Ravi".to_string(),
            pin: "2468".to_string(),
            role: Role::User,
            salary: None,
        }
        .into_account()
        .unwrap();
        let json = serde_json::to_value(AccountResponse::from(account)).unwrap();
        assert!(json.get("pin").is_none());
        assert_eq!(json["role"], "user");
    }
}
