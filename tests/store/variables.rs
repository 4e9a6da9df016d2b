//! Integration tests for VariableStore
//!
//! Tests bindings, snapshots, and statistics.

use segrun_foundation::{ErrorKind, Value};
use segrun_store::VariableStore;

#[test]
fn set_get_delete() {
    let mut store = VariableStore::new();
    store.set("a", Value::from(vec![1i64]));
    assert!(store.contains("a"));
    assert_eq!(store.get("a").unwrap(), &Value::from(vec![1i64]));

    store.set("a", Value::from(vec![2i64]));
    assert_eq!(store.len(), 1);
    assert_eq!(store.delete("a").unwrap(), Value::from(vec![2i64]));
    assert!(store.is_empty());
}

#[test]
fn missing_names() {
    let mut store = VariableStore::new();
    assert_eq!(
        store.get("ghost").unwrap_err().kind,
        ErrorKind::VariableNotFound("ghost".into())
    );
    assert!(store.delete("ghost").is_err());
}

#[test]
fn iteration_is_name_ordered() {
    let mut store = VariableStore::new();
    for name in ["c", "a", "b"] {
        store.set(name, Value::from(vec![0i64]));
    }
    let names: Vec<&str> = store.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn snapshot_restore_discards_later_changes() {
    let mut store = VariableStore::new();
    store.set("keep", Value::from(vec![1i64]));
    let snapshot = store.snapshot();

    store.set("keep", Value::from(vec![2i64]));
    store.set("extra", Value::from(vec![3i64]));
    store.restore(snapshot);

    assert_eq!(store.get("keep").unwrap(), &Value::from(vec![1i64]));
    assert!(!store.contains("extra"));
}

#[test]
fn snapshots_are_independent_of_each_other() {
    let mut store = VariableStore::new();
    let empty = store.snapshot();
    store.set("x", Value::from(vec![1i64]));
    let one = store.snapshot();
    store.clear();

    store.restore(one);
    assert_eq!(store.len(), 1);
    store.restore(empty);
    assert!(store.is_empty());
}

#[test]
fn stats_count_elements() {
    let mut store = VariableStore::new();
    store.set("a", Value::from(vec![1i64, 2, 3]));
    store.set("b", Value::bytes(b"abcd").unwrap());
    let stats = store.stats();
    assert_eq!(stats.variables, 2);
    assert_eq!(stats.elements, 4);
    assert!(stats.bytes >= 28);
}
