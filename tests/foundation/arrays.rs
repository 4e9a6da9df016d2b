//! Integration tests for array operations
//!
//! Tests indexing, search, sorting, arithmetic and scatter reductions.

use segrun_foundation::arith::{self, BinaryOp, UnaryOp};
use segrun_foundation::array::{self, ReduceOp};
use segrun_foundation::{ErrorKind, Slice, TypeCode, Value};

fn ints(xs: &[i64]) -> Value {
    Value::from(xs.to_vec())
}

// =============================================================================
// Indexing
// =============================================================================

#[test]
fn get_items_accepts_negative_keys() {
    let target = ints(&[10, 20, 30]);
    assert_eq!(
        array::get_items(&target, &ints(&[-1, 0])).unwrap(),
        ints(&[30, 10])
    );
}

#[test]
fn get_items_out_of_range() {
    let err = array::get_items(&ints(&[1, 2]), &ints(&[2])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfRange { index: 2, length: 2 }));
}

#[test]
fn set_items_without_keys_replaces_target() {
    let out = array::set_items(&ints(&[1, 2, 3]), None, &ints(&[9])).unwrap();
    assert_eq!(out, ints(&[9]));
}

#[test]
fn set_items_with_keys() {
    let out = array::set_items(&ints(&[1, 2, 3]), Some(&ints(&[0, -1])), &ints(&[7, 8])).unwrap();
    assert_eq!(out, ints(&[7, 2, 8]));
}

#[test]
fn slices_resolve_like_ranges() {
    let s = Slice::new(None, None, Some(-1));
    assert_eq!(s.indices(4).unwrap(), vec![3, 2, 1, 0]);
    let s = Slice::new(Some(1), Some(10), Some(2));
    assert_eq!(s.indices(6).unwrap(), vec![1, 3, 5]);
    assert!(Slice::new(None, None, Some(0)).indices(3).is_err());
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn index_of_reports_first_position_or_minus_one() {
    let target = ints(&[5, 7, 5, 9]);
    assert_eq!(
        array::index_of(&target, &ints(&[5, 9, 4])).unwrap(),
        vec![0, 3, -1]
    );
}

#[test]
fn contains_agrees_with_index_of() {
    let target = ints(&[5, 7, 5, 9]);
    let probes = ints(&[4, 5, 6, 7, 8, 9]);
    let found = array::contains(&target, &probes).unwrap();
    let positions = array::index_of(&target, &probes).unwrap();
    for (hit, pos) in found.iter().zip(&positions) {
        assert_eq!(*hit == 1, *pos >= 0);
    }
}

#[test]
fn lookup_with_default() {
    let out = array::lookup(&ints(&[10, 20]), &ints(&[1, 5]), Some(&ints(&[-1]))).unwrap();
    assert_eq!(out, ints(&[20, -1]));
    assert!(array::lookup(&ints(&[10, 20]), &ints(&[5]), None).is_err());
}

#[test]
fn byte_rows_search_by_row() {
    let target = Value::bytes(b"ab").unwrap();
    let found = array::contains(&target, &Value::bytes(b"ab").unwrap()).unwrap();
    assert_eq!(found, vec![1]);
    assert!(array::contains(&target, &ints(&[1])).is_err());
}

// =============================================================================
// Sorting and Reduction
// =============================================================================

#[test]
fn sorted_both_directions() {
    let v = ints(&[3, 1, 2]);
    assert_eq!(array::sorted(&v, false).unwrap(), ints(&[1, 2, 3]));
    assert_eq!(array::sorted(&v, true).unwrap(), ints(&[3, 2, 1]));
    assert_eq!(array::argsort(&v, false).unwrap(), vec![1, 2, 0]);
}

#[test]
fn cumulative_and_reduce() {
    let v = ints(&[1, 2, 3]);
    assert_eq!(array::cumsum(&v).unwrap(), ints(&[1, 3, 6]));
    assert_eq!(array::reduce(&v, ReduceOp::Sum).unwrap(), ints(&[6]));
    assert_eq!(array::reduce(&v, ReduceOp::Max).unwrap(), ints(&[3]));
    assert_eq!(array::reduce(&v, ReduceOp::Xor).unwrap(), ints(&[0]));
}

#[test]
fn arange_variants() {
    assert_eq!(array::arange(0, 5, 2).unwrap(), ints(&[0, 2, 4]));
    assert_eq!(array::arange(3, 0, -1).unwrap(), ints(&[3, 2, 1]));
    assert!(matches!(array::arange(0, 5, 0).unwrap_err().kind, ErrorKind::ZeroStep));
}

#[test]
fn select_picks_elementwise() {
    let out = array::select(&ints(&[1, 0, 1]), &ints(&[1, 2, 3]), &ints(&[7, 8, 9])).unwrap();
    assert_eq!(out, ints(&[1, 8, 3]));
}

#[test]
fn broadcast_length_rules() {
    assert_eq!(array::broadcast_length(&[1, 4, 1]), 4);
    assert_eq!(array::broadcast(&ints(&[5]), 3).unwrap(), ints(&[5, 5, 5]));
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn checked_versus_wrapping_add() {
    let max = ints(&[i64::MAX]);
    let one = ints(&[1]);
    assert!(matches!(
        arith::binary(BinaryOp::Add, &max, &one).unwrap_err().kind,
        ErrorKind::Overflow(_)
    ));
    assert_eq!(
        arith::binary(BinaryOp::WrappingAdd, &max, &one).unwrap(),
        ints(&[i64::MIN])
    );
}

#[test]
fn length_one_operands_broadcast() {
    let out = arith::binary(BinaryOp::Mul, &ints(&[1, 2, 3]), &ints(&[2])).unwrap();
    assert_eq!(out, ints(&[2, 4, 6]));
    let err = arith::binary(BinaryOp::Add, &ints(&[1, 2]), &ints(&[1, 2, 3])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LengthMismatch { .. }));
}

#[test]
fn integer_true_division_gives_floats() {
    let out = arith::binary(BinaryOp::TrueDiv, &ints(&[1]), &ints(&[2])).unwrap();
    assert_eq!(out, Value::from(vec![0.5f64]));
    assert_eq!(out.typecode(), Some(TypeCode::Float));
}

#[test]
fn division_by_zero() {
    let err = arith::binary(BinaryOp::FloorDiv, &ints(&[1]), &ints(&[0])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
}

#[test]
fn divmod_floors_toward_negative_infinity() {
    let out = arith::divmod(&ints(&[-7]), &ints(&[2])).unwrap();
    let (q, r) = out.as_pair().unwrap();
    assert_eq!(q, &ints(&[-4]));
    assert_eq!(r, &ints(&[1]));
}

#[test]
fn unary_neg_overflow() {
    assert_eq!(arith::unary(UnaryOp::Neg, &ints(&[3])).unwrap(), ints(&[-3]));
    assert!(arith::unary(UnaryOp::Neg, &ints(&[i64::MIN])).is_err());
}

#[test]
fn comparisons_give_integers() {
    let out = arith::binary(
        BinaryOp::Lt,
        &Value::from(vec![1.0f64, 3.0]),
        &Value::from(vec![2.0f64]),
    )
    .unwrap();
    assert_eq!(out, ints(&[1, 0]));
}
