//! Integration tests for ListMap and NodeTree
//!
//! Tests composite keys, position bookkeeping, and tree grafting.

use segrun_foundation::{ErrorKind, ListMap, Node, NodeTree, TypeCode, Value};

fn ints(xs: &[i64]) -> Value {
    Value::from(xs.to_vec())
}

fn two_column_map() -> ListMap {
    ListMap::from_columns(
        vec![TypeCode::Integer, TypeCode::Integer],
        &[&ints(&[1, 2, 3]), &ints(&[10, 20, 30])],
    )
    .unwrap()
}

// =============================================================================
// ListMap
// =============================================================================

#[test]
fn listmap_positions_follow_insertion() {
    let map = two_column_map();
    assert_eq!(map.len(), 3);
    assert_eq!(
        map.lookup(&[&ints(&[3, 1]), &ints(&[30, 10])], None).unwrap(),
        vec![2, 0]
    );
}

#[test]
fn listmap_lookup_miss() {
    let map = two_column_map();
    let err = map.lookup(&[&ints(&[1]), &ints(&[99])], None).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::KeyNotFound(_)));
    assert_eq!(
        map.lookup(&[&ints(&[1]), &ints(&[99])], Some(-1)).unwrap(),
        vec![-1]
    );
}

#[test]
fn listmap_contains_matches_lookup() {
    let map = two_column_map();
    let a = ints(&[1, 2, 5]);
    let b = ints(&[10, 99, 50]);
    let found = map.contains(&[&a, &b]).unwrap();
    let positions = map.lookup(&[&a, &b], Some(-1)).unwrap();
    assert_eq!(found, vec![1, 0, 0]);
    for (hit, pos) in found.iter().zip(&positions) {
        assert_eq!(*hit == 1, *pos >= 0);
    }
}

#[test]
fn listmap_duplicate_insert() {
    let mut map = two_column_map();
    let err = map.insert(&[&ints(&[1]), &ints(&[10])], false).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateKey(_)));
    assert_eq!(map.len(), 3);

    let (added, positions) = map
        .insert(&[&ints(&[1, 4]), &ints(&[10, 40])], true)
        .unwrap();
    assert_eq!(added, vec![ints(&[4]), ints(&[40])]);
    assert_eq!(positions, vec![3]);
}

#[test]
fn listmap_remove_compacts() {
    let mut map = two_column_map();
    let removal = map.remove(&[&ints(&[1]), &ints(&[10])], false).unwrap();
    assert_eq!(removal.removed, vec![0]);
    assert_eq!(removal.moved_from, vec![1, 2]);
    assert_eq!(removal.moved_to, vec![0, 1]);
    assert_eq!(
        map.lookup(&[&ints(&[3]), &ints(&[30])], None).unwrap(),
        vec![1]
    );
}

#[test]
fn listmap_remove_missing() {
    let mut map = two_column_map();
    assert!(map.remove(&[&ints(&[7]), &ints(&[7])], false).is_err());
    assert_eq!(map.len(), 3);
    let removal = map.remove(&[&ints(&[7]), &ints(&[7])], true).unwrap();
    assert!(removal.removed.is_empty());
}

#[test]
fn listmap_intersect_keeps_own_order() {
    let map = two_column_map();
    let common = map
        .intersect(&[&ints(&[3, 1, 8]), &ints(&[30, 10, 80])])
        .unwrap();
    assert_eq!(common.key_columns().unwrap(), vec![ints(&[1, 3]), ints(&[10, 30])]);
}

#[test]
fn listmap_rejects_bad_layouts() {
    assert!(ListMap::new(vec![]).is_err());
    assert!(ListMap::new(vec![TypeCode::Ed25519]).is_err());
    let map = two_column_map();
    assert!(map.contains(&[&ints(&[1])]).is_err());
    assert!(map.rows_unique(&[&ints(&[1, 1]), &ints(&[2, 3])]).unwrap());
    assert!(!map.rows_unique(&[&ints(&[1, 1]), &ints(&[2, 2])]).unwrap());
}

// =============================================================================
// NodeTree
// =============================================================================

#[test]
fn node_tree_attach() {
    let mut root = NodeTree::new("root", None);
    let mut branch = NodeTree::new("branch", Some(ints(&[1])));
    branch.attach(0, &NodeTree::new("leaf", None)).unwrap();

    let at = root.attach(0, &branch).unwrap();
    assert_eq!(at, 1);
    assert_eq!(root.len(), 3);
    assert_eq!(root.node(0).unwrap().children, vec![1]);
    assert_eq!(root.node(1).unwrap().children, vec![2]);
    assert_eq!(root.node(2).unwrap().label, "leaf");
    assert!(root.attach(9, &branch).is_err());
}

#[test]
fn node_tree_validates_links() {
    let bad = vec![Node {
        label: "loop".into(),
        payload: None,
        children: vec![0],
    }];
    assert!(NodeTree::from_nodes(bad).is_err());
    assert!(NodeTree::from_nodes(vec![]).is_err());
}
