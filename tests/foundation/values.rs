//! Integration tests for Value and TypeCode
//!
//! Tests typecode parsing, value construction, typing and display.

use segrun_foundation::{ByteRows, TypeCode, Value, ValueType};

// =============================================================================
// TypeCode
// =============================================================================

#[test]
fn typecode_parse_single() {
    assert_eq!("i".parse::<TypeCode>().unwrap(), TypeCode::Integer);
    assert_eq!("f".parse::<TypeCode>().unwrap(), TypeCode::Float);
    assert_eq!("b16".parse::<TypeCode>().unwrap(), TypeCode::ByteArray(16));
    assert_eq!("I".parse::<TypeCode>().unwrap(), TypeCode::Ed25519Int);
    assert_eq!("E".parse::<TypeCode>().unwrap(), TypeCode::Ed25519);
}

#[test]
fn typecode_parse_many() {
    assert_eq!(
        TypeCode::parse_many("ib8f").unwrap(),
        vec![TypeCode::Integer, TypeCode::ByteArray(8), TypeCode::Float]
    );
}

#[test]
fn typecode_rejects_garbage() {
    for text in ["", "x", "b", "b0", "b08", "ii"] {
        assert!(text.parse::<TypeCode>().is_err(), "{text:?} parsed");
    }
}

#[test]
fn typecode_widths() {
    assert_eq!(TypeCode::Integer.width(), 8);
    assert_eq!(TypeCode::ByteArray(5).width(), 5);
    assert_eq!(TypeCode::Ed25519Int.width(), 32);
    assert_eq!(TypeCode::Ed25519.width(), 64);
    assert!(TypeCode::Ed25519.is_byte_oriented());
    assert!(TypeCode::Float.is_numeric());
}

#[test]
fn typecode_display_round_trips() {
    for code in [TypeCode::Integer, TypeCode::ByteArray(12), TypeCode::Ed25519] {
        assert_eq!(code.to_string().parse::<TypeCode>().unwrap(), code);
    }
}

// =============================================================================
// Value
// =============================================================================

#[test]
fn value_typecodes() {
    assert_eq!(Value::from(vec![1i64]).typecode(), Some(TypeCode::Integer));
    assert_eq!(Value::from(vec![1.0f64]).typecode(), Some(TypeCode::Float));
    assert_eq!(
        Value::bytes(b"abc").unwrap().typecode(),
        Some(TypeCode::ByteArray(3))
    );
    let pair = Value::pair(Value::from(vec![1i64]), Value::from(vec![2.0f64]));
    assert_eq!(pair.typecode(), None);
}

#[test]
fn value_lengths() {
    assert_eq!(Value::from(vec![1i64, 2, 3]).len(), Some(3));
    assert_eq!(Value::from(Vec::<f64>::new()).len(), Some(0));
    let rows = ByteRows::from_flat(2, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(Value::from(rows).len(), Some(2));
}

#[test]
fn value_zeros() {
    assert_eq!(
        Value::zeros(TypeCode::Integer, 3).unwrap(),
        Value::from(vec![0i64, 0, 0])
    );
    let rows = Value::zeros(TypeCode::ByteArray(4), 2).unwrap();
    assert_eq!(rows.rows().unwrap().as_bytes(), &[0u8; 8]);
}

#[test]
fn value_single_accessors() {
    assert_eq!(Value::from(vec![7i64]).single_int().unwrap(), 7);
    assert!(Value::from(vec![1i64, 2]).single_int().is_err());
    assert!(Value::from(vec![1.0f64]).single_int().is_err());
    assert_eq!(Value::bytes(b"xy").unwrap().single_row().unwrap(), b"xy");
}

#[test]
fn value_type_describes_pair() {
    let pair = Value::pair(Value::from(vec![1i64]), Value::bytes(b"a").unwrap());
    let (first, second) = pair.as_pair().unwrap();
    assert_eq!(first, &Value::from(vec![1i64]));
    assert_eq!(second.typecode(), Some(TypeCode::ByteArray(1)));
    assert!(matches!(pair.value_type(), ValueType::Pair));
}

#[test]
fn byte_rows_reject_ragged_data() {
    assert!(ByteRows::from_flat(3, vec![1, 2, 3, 4]).is_err());
    assert!(ByteRows::new(0).is_err());
    let mut rows = ByteRows::new(2).unwrap();
    rows.push(&[1, 2]).unwrap();
    assert!(rows.push(&[1]).is_err());
    assert_eq!(rows.len(), 1);
}
