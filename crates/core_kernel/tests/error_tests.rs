//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::ports::PortError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Account not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Account not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::InvalidAmount("abc".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
    assert!(core_error.to_string().contains("abc"));
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_port_error_conflict_is_not_transient() {
    let error = PortError::conflict("version mismatch");

    assert!(error.is_conflict());
    assert!(!error.is_transient());
    assert!(!error.is_not_found());
}

#[test]
fn test_port_error_validation_field() {
    let error = PortError::validation_field("must not be empty", "name");

    match error {
        PortError::Validation { message, field } => {
            assert_eq!(message, "must not be empty");
            assert_eq!(field.as_deref(), Some("name"));
        }
        _ => panic!("Expected Validation error"),
    }
}
