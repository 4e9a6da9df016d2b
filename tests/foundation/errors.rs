//! Integration tests for Error
//!
//! Tests error construction, context, and display.

use segrun_foundation::{Error, ErrorContext, ErrorKind, TypeCode, ValueType};

#[test]
fn error_display() {
    let err = Error::variable_not_found("x");
    assert_eq!(err.to_string(), "variable not found: x");

    let err = Error::invalid_key_length(32, 5);
    assert_eq!(
        err.to_string(),
        "invalid key length: expected 32 bytes, got 5"
    );
}

#[test]
fn error_kinds() {
    assert!(matches!(
        Error::type_mismatch("i", ValueType::Array(TypeCode::Float)).kind,
        ErrorKind::TypeMismatch { .. }
    ));
    assert!(matches!(
        Error::transmission("2", "down").kind,
        ErrorKind::TransmissionError { ref peer, .. } if peer == "2"
    ));
    assert_eq!(
        Error::aux_store("disk full").kind,
        ErrorKind::AuxStoreError("disk full".into())
    );
}

#[test]
fn error_context_is_attached() {
    let context = ErrorContext::new()
        .with_opcode("getitem")
        .with_position(4)
        .with_variable("a");
    let err = Error::index_out_of_range(9, 2).with_context(context.clone());
    assert_eq!(err.context, Some(context));
    assert_eq!(err.kind, ErrorKind::IndexOutOfRange { index: 9, length: 2 });
}

#[test]
fn context_display() {
    let context = ErrorContext::new().with_opcode("sha").with_position(1);
    assert_eq!(context.to_string(), "in sha at step 1");
}
