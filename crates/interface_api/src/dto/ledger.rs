//! Expense, fund and transaction DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    /// Category label or snake_case name
    pub category: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub amount: Decimal,
    /// Receipt reference; `photo_url` is accepted as an older spelling
    #[serde(rename = "image", alias = "photo_url", default)]
    #[validate(length(max = 2048))]
    pub receipt: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddFundsRequest {
    #[serde(alias = "user_id")]
    pub account_id: String,
    #[serde(alias = "type")]
    pub pool: String,
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// `YYYY-MM` or `YYYY-MM-DD`; required for salary credits
    pub salary_month: Option<String>,
}

/// Query string for `GET /expenses`
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub account_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query string for `GET /transactions`
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub q: Option<String>,
    pub pool: Option<String>,
    pub date: Option<NaiveDate>,
    pub account_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_accepts_both_spellings() {
        let canonical: CreateExpenseRequest = serde_json::from_str(
            r#"{"category":"Travel","description":"cab","amount":"120","image":"r/1.jpg"}"#,
        )
        .unwrap();
        assert_eq!(canonical.receipt.as_deref(), Some("r/1.jpg"));

        let legacy: CreateExpenseRequest = serde_json::from_str(
            r#"{"category":"Travel","description":"cab","amount":120,"photo_url":"r/2.jpg"}"#,
        )
        .unwrap();
        assert_eq!(legacy.receipt.as_deref(), Some("r/2.jpg"));
    }

    #[test]
    fn test_fund_request_accepts_original_field_names() {
        let request: AddFundsRequest = serde_json::from_str(
            r#"{"user_id":"USR-6f1c2f8e-3b9b-4a7a-9d8e-1f2a3b4c5d6e","type":"salary","amount":"45000","salary_month":"2024-03"}"#,
        )
        .unwrap();
        assert_eq!(request.pool, "salary");
        assert_eq!(request.salary_month.as_deref(), Some("2024-03"));
    }
}
