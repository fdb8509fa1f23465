//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_ledger::LedgerError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The balance write lost every compare-and-swap attempt; nothing changed
    #[error("Balance update failed: {0}")]
    BalanceUpdateFailed(String),

    /// A balance moved without its audit record
    #[error("Ledger out of sync: {0}")]
    LedgerOutOfSync(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String, Vec<String>),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into(), Vec::new())
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::BalanceUpdateFailed(_) => (StatusCode::CONFLICT, "balance_update_failed"),
            ApiError::LedgerOutOfSync(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ledger_out_of_sync"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            ApiError::Validation(..) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();
        let (message, details) = match self {
            ApiError::Validation(msg, details) if !details.is_empty() => (msg, Some(details)),
            ApiError::Validation(msg, _)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BalanceUpdateFailed(msg)
            | ApiError::LedgerOutOfSync(msg)
            | ApiError::Internal(msg)
            | ApiError::Storage(msg)
            | ApiError::Unavailable(msg) => (msg, None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(msg) => ApiError::NotFound(msg),
            LedgerError::Validation(msg) => ApiError::validation(msg),
            LedgerError::Forbidden(msg) => ApiError::Forbidden(msg),
            LedgerError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".to_string()),
            e @ LedgerError::BalanceUpdateFailed { .. } => ApiError::BalanceUpdateFailed(e.to_string()),
            e @ LedgerError::LedgerAppendFailed { .. } => {
                error!(error = %e, "Balance and ledger are out of sync; manual reconciliation required");
                ApiError::LedgerOutOfSync(e.to_string())
            }
            LedgerError::Storage(port) => {
                error!(error = %port, "Storage failure");
                ApiError::Storage(port.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Encoding(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::Validation("Request validation failed".to_string(), details)
    }
}
