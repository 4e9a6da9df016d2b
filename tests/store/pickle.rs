//! Integration tests for the pickle format
//!
//! Tests value and store encoding, typecode checking, and file save/load.

use segrun_foundation::{ErrorKind, ListMap, NodeTree, Slice, TypeCode, Value};
use segrun_store::pickle::{self, Payload};
use segrun_store::{PickleRecord, VariableStore, pickle_value, unpickle_value};

fn sample_values() -> Vec<Value> {
    let map = ListMap::from_columns(
        vec![TypeCode::Integer, TypeCode::ByteArray(2)],
        &[
            &Value::from(vec![1i64, 2]),
            &Value::from(segrun_foundation::ByteRows::from_flat(2, b"abcd".to_vec()).unwrap()),
        ],
    )
    .unwrap();
    let mut tree = NodeTree::new("root", None);
    tree.attach(0, &NodeTree::new("leaf", Some(Value::from(vec![4i64]))))
        .unwrap();
    vec![
        Value::from(vec![1i64, -2]),
        Value::from(vec![0.5f64]),
        Value::bytes(b"hello").unwrap(),
        Value::from(map),
        Value::pair(Value::from(vec![1i64]), Value::bytes(b"x").unwrap()),
        Value::from(tree),
        Value::from(Slice::new(Some(1), None, Some(-1))),
    ]
}

#[test]
fn every_kind_of_value_survives() {
    for value in sample_values() {
        let bytes = pickle_value(&value).unwrap();
        assert_eq!(unpickle_value(&bytes).unwrap(), value);
    }
}

#[test]
fn record_carries_textual_typecode() {
    let record = PickleRecord::from_value(&Value::bytes(b"abc").unwrap()).unwrap();
    assert_eq!(record.typecode, "b3");
    assert!(matches!(record.payload, Payload::Rows { width: 3, .. }));
}

#[test]
fn mismatched_typecode_is_rejected() {
    let mut record = PickleRecord::from_value(&Value::from(vec![1i64])).unwrap();
    record.typecode = "f".to_string();
    let err = record.into_value().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SerializationError(_)));
}

#[test]
fn garbage_bytes_are_rejected() {
    assert!(unpickle_value(b"definitely not msgpack").is_err());
}

#[test]
fn whole_store_round_trip() {
    let mut store = VariableStore::new();
    for (i, value) in sample_values().into_iter().enumerate() {
        store.set(format!("v{i}"), value);
    }
    let bytes = pickle::pickle_store(&store).unwrap();
    assert_eq!(pickle::unpickle_store(&bytes).unwrap(), store);
}

#[test]
fn file_save_and_load() {
    let path = std::env::temp_dir().join(format!("segrun-store-{}.pickle", std::process::id()));
    let mut store = VariableStore::new();
    store.set("a", Value::from(vec![1i64, 2, 3]));
    pickle::save_to_file(&store, &path).unwrap();
    assert_eq!(pickle::load_from_file(&path).unwrap(), store);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = pickle::load_from_file("/nonexistent/segrun/store.pickle").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IoError(_)));
}
