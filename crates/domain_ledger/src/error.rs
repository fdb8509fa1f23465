//! Ledger domain errors

use thiserror::Error;

use core_kernel::{AccountId, CoreError, Money, MoneyError, PortError};

use crate::account::Pool;

/// Errors that can occur in the ledger domain
///
/// `BalanceUpdateFailed` is a clean failure: nothing was written.
/// `LedgerAppendFailed` means the balance already moved but no audit record
/// exists; the caller must surface it for manual reconciliation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Account, ledger entry or expense missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The actor is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Name/PIN pair did not match an account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The balance write was rejected; no ledger entry was written
    #[error("Balance update failed for {account_id} ({pool}): {reason}")]
    BalanceUpdateFailed {
        account_id: AccountId,
        pool: Pool,
        reason: String,
    },

    /// The balance changed but the audit record could not be written
    #[error(
        "Ledger append failed for {account_id} ({pool}) after balance moved by {delta} to {new_balance}: {reason}"
    )]
    LedgerAppendFailed {
        account_id: AccountId,
        pool: Pool,
        delta: Money,
        new_balance: Money,
        reason: String,
    },

    /// Underlying store failure on a read path
    #[error("Storage error: {0}")]
    Storage(PortError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        LedgerError::Forbidden(message.into())
    }

    /// Returns true if the balance and ledger are now out of sync
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, LedgerError::LedgerAppendFailed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

impl From<PortError> for LedgerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                LedgerError::NotFound(format!("{} {}", entity_type, id))
            }
            PortError::Validation { message, .. } => LedgerError::Validation(message),
            other => LedgerError::Storage(other),
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => LedgerError::NotFound(msg),
            other => LedgerError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_maps_to_not_found() {
        let err: LedgerError = PortError::not_found("Account", "USR-1").into();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("USR-1"));
    }

    #[test]
    fn test_port_internal_maps_to_storage() {
        let err: LedgerError = PortError::internal("disk full").into();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(!err.is_inconsistent());
    }

    #[test]
    fn test_money_error_is_validation() {
        let err: LedgerError = MoneyError::InvalidAmount("x".to_string()).into();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
