//! Authentication

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::AccountId;
use domain_ledger::{Account, Actor, Role};

/// Upper bound on token lifetime (one year)
const MAX_EXPIRATION_SECS: u64 = 366 * 24 * 60 * 60;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Account roles
    pub roles: Vec<String>,
    /// Display name at sign-in
    pub name: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// The acting account described by this token
    pub fn actor(&self) -> Result<Actor, AuthError> {
        let account_id: AccountId = self.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        let role = if self.roles.iter().any(|r| r == Role::Admin.as_str()) {
            Role::Admin
        } else {
            Role::User
        };
        Ok(Actor {
            account_id,
            name: self.name.clone(),
            role,
        })
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token could not be issued: {0}")]
    Encoding(String),
}

/// Issues a token for a signed-in account
pub fn create_token(account: &Account, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs.min(MAX_EXPIRATION_SECS) as i64);

    let claims = Claims {
        sub: account.id.as_uuid().to_string(),
        roles: vec![account.role.as_str().to_string()],
        name: account.name.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Validates a token and returns its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}
