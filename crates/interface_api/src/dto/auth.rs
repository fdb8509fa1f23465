//! Sign-in DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_ledger::BalanceSnapshot;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 4, max = 6, message = "PIN must be 4-6 digits"))]
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: BalanceSnapshot,
}
