//! Structural operations on array values.
//!
//! Every function here is pure: it borrows its inputs and returns a new
//! [`Value`], so a caller that fails halfway has nothing to roll back.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::Result;
use crate::error::{Error, ErrorKind};
use crate::rows::ByteRows;
use crate::typecode::TypeCode;
use crate::value::{Value, check_array_size};

// =============================================================================
// Column abstraction
// =============================================================================

/// Element types stored in plain vectors.
pub(crate) trait Scalar: Copy + Default {
    fn order(&self, other: &Self) -> Ordering;
    fn key(&self) -> [u8; 8];
    fn is_zero(&self) -> bool;
}

impl Scalar for i64 {
    fn order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
    fn key(&self) -> [u8; 8] {
        self.to_le_bytes()
    }
    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl Scalar for f64 {
    fn order(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
    fn key(&self) -> [u8; 8] {
        self.to_bits().to_le_bytes()
    }
    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

/// Storage shared by all array variants, so each operation is written once.
pub(crate) trait Column: Clone {
    fn column_len(&self) -> usize;
    /// Elements at `indices`; the caller guarantees bounds.
    fn gather(&self, indices: &[usize]) -> Self;
    /// Writes `src` (broadcast if it has one element) at `indices`.
    fn assign(&mut self, indices: &[usize], src: &Self);
    fn resized(&self, len: usize) -> Self;
    fn appended(&self, other: &Self) -> Self;
    fn cmp_at(&self, a: usize, b: usize) -> Ordering;
    fn key_at(&self, i: usize) -> Vec<u8>;
    fn zero_at(&self, i: usize) -> bool;
}

impl<T: Scalar> Column for Vec<T> {
    fn column_len(&self) -> usize {
        self.len()
    }
    fn gather(&self, indices: &[usize]) -> Self {
        indices.iter().map(|&i| self[i]).collect()
    }
    fn assign(&mut self, indices: &[usize], src: &Self) {
        for (n, &i) in indices.iter().enumerate() {
            self[i] = if src.len() == 1 { src[0] } else { src[n] };
        }
    }
    fn resized(&self, len: usize) -> Self {
        let mut out = self.clone();
        out.resize(len, T::default());
        out
    }
    fn appended(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.extend_from_slice(other);
        out
    }
    fn cmp_at(&self, a: usize, b: usize) -> Ordering {
        self[a].order(&self[b])
    }
    fn key_at(&self, i: usize) -> Vec<u8> {
        self[i].key().to_vec()
    }
    fn zero_at(&self, i: usize) -> bool {
        self[i].is_zero()
    }
}

impl Column for ByteRows {
    fn column_len(&self) -> usize {
        self.len()
    }
    fn gather(&self, indices: &[usize]) -> Self {
        self.take(indices)
    }
    fn assign(&mut self, indices: &[usize], src: &Self) {
        for (n, &i) in indices.iter().enumerate() {
            let from = if src.len() == 1 { 0 } else { n };
            if let Some(row) = src.row(from) {
                let row = row.to_vec();
                self.set_row(i, &row);
            }
        }
    }
    fn resized(&self, len: usize) -> Self {
        let mut out = self.clone();
        out.resize(len);
        out
    }
    fn appended(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.append(other);
        out
    }
    fn cmp_at(&self, a: usize, b: usize) -> Ordering {
        self.cmp_rows(a, b)
    }
    fn key_at(&self, i: usize) -> Vec<u8> {
        self.row(i).map(<[u8]>::to_vec).unwrap_or_default()
    }
    fn zero_at(&self, i: usize) -> bool {
        self.row(i).is_some_and(|row| row.iter().all(|&b| b == 0))
    }
}

/// Applies `$body` to the column inside an array value, returning the result as is.
macro_rules! with_array {
    ($value:expr, $col:ident => $body:expr) => {
        match $value {
            Value::IntegerArray($col) => $body,
            Value::FloatArray($col) => $body,
            Value::ByteArrayArray($col) | Value::Ed25519IntArray($col) | Value::Ed25519Array($col) => {
                $body
            }
            other => return Err(Error::type_mismatch("array", other.value_type())),
        }
    };
}

/// Applies `$body` to the column inside an array value and rewraps the
/// result in the same variant.
macro_rules! map_array {
    ($value:expr, $col:ident => $body:expr) => {
        match $value {
            Value::IntegerArray($col) => Value::IntegerArray($body),
            Value::FloatArray($col) => Value::FloatArray($body),
            Value::ByteArrayArray($col) => Value::ByteArrayArray($body),
            Value::Ed25519IntArray($col) => Value::Ed25519IntArray($body),
            Value::Ed25519Array($col) => Value::Ed25519Array($body),
            other => return Err(Error::type_mismatch("array", other.value_type())),
        }
    };
}

/// Like `map_array!` over two arrays that must share a typecode.
macro_rules! zip_arrays {
    ($a:expr, $b:expr, $x:ident, $y:ident => $body:expr) => {
        match ($a, $b) {
            (Value::IntegerArray($x), Value::IntegerArray($y)) => Value::IntegerArray($body),
            (Value::FloatArray($x), Value::FloatArray($y)) => Value::FloatArray($body),
            (Value::ByteArrayArray($x), Value::ByteArrayArray($y)) if $x.width() == $y.width() => {
                Value::ByteArrayArray($body)
            }
            (Value::Ed25519IntArray($x), Value::Ed25519IntArray($y)) => {
                Value::Ed25519IntArray($body)
            }
            (Value::Ed25519Array($x), Value::Ed25519Array($y)) => Value::Ed25519Array($body),
            (a, b) => return Err($crate::array::mismatch(a, b)),
        }
    };
}

/// Like `with_array!` over two arrays that must share a typecode.
macro_rules! zip_with {
    ($a:expr, $b:expr, $x:ident, $y:ident => $body:expr) => {
        match ($a, $b) {
            (Value::IntegerArray($x), Value::IntegerArray($y)) => $body,
            (Value::FloatArray($x), Value::FloatArray($y)) => $body,
            (Value::ByteArrayArray($x), Value::ByteArrayArray($y))
            | (Value::Ed25519IntArray($x), Value::Ed25519IntArray($y))
            | (Value::Ed25519Array($x), Value::Ed25519Array($y))
                if $x.width() == $y.width() =>
            {
                $body
            }
            (a, b) => return Err($crate::array::mismatch(a, b)),
        }
    };
}

/// Bytes per element of an array value; non-arrays count as one word.
fn element_width(value: &Value) -> usize {
    value.typecode().map_or(8, TypeCode::width)
}

/// Type mismatch between two operands that must agree.
pub(crate) fn mismatch(expected: &Value, actual: &Value) -> Error {
    match expected.typecode() {
        Some(code) => Error::type_mismatch(code.to_string(), actual.value_type()),
        None => Error::type_mismatch("array", expected.value_type()),
    }
}

fn positions(indices: impl IntoIterator<Item = usize>) -> Vec<i64> {
    indices.into_iter().map(|i| i as i64).collect()
}

// =============================================================================
// Construction and shape
// =============================================================================

/// Number of elements in a value.
///
/// # Errors
///
/// Returns `TypeMismatch` for a slice, which has no length until resolved.
pub fn length(value: &Value) -> Result<usize> {
    value
        .len()
        .ok_or_else(|| Error::type_mismatch("sized value", value.value_type()))
}

/// Integers from `start` towards `stop` (exclusive) by `step`.
///
/// # Errors
///
/// Returns `ZeroStep` if `step` is zero and `InvalidInput` if the range
/// would exceed [`MAX_ARRAY_BYTES`](crate::MAX_ARRAY_BYTES).
pub fn arange(start: i64, stop: i64, step: i64) -> Result<Value> {
    if step == 0 {
        return Err(Error::new(ErrorKind::ZeroStep));
    }
    let (span, step) = (i128::from(stop) - i128::from(start), i128::from(step));
    let count = if span.signum() == step.signum() {
        (span + step - step.signum()) / step
    } else {
        0
    };
    let count = usize::try_from(count).map_err(|_| Error::overflow("arange"))?;
    check_array_size(count, 8)?;
    Ok(Value::IntegerArray(
        (0..count)
            .map(|n| (i128::from(start) + step * n as i128) as i64)
            .collect(),
    ))
}

/// Floats from `start` towards `stop` (exclusive) by `step`.
///
/// # Errors
///
/// Returns `ZeroStep` if `step` is zero, `InvalidInput` for non-finite
/// bounds, and `Overflow` or `InvalidInput` for a range too long to build.
#[allow(clippy::cast_precision_loss)]
pub fn arange_float(start: f64, stop: f64, step: f64) -> Result<Value> {
    if step == 0.0 {
        return Err(Error::new(ErrorKind::ZeroStep));
    }
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
        return Err(Error::invalid_input("arange bounds must be finite"));
    }
    let count = ((stop - start) / step).ceil().max(0.0);
    if !count.is_finite() || count >= usize::MAX as f64 {
        return Err(Error::overflow("arange"));
    }
    let count = count as usize;
    check_array_size(count, 8)?;
    Ok(Value::FloatArray(
        (0..count).map(|n| start + step * n as f64).collect(),
    ))
}

/// Resolves a key operand (an `i` array or a slice) into in-bounds positions.
///
/// Negative integers count from the end.
///
/// # Errors
///
/// Returns `IndexOutOfRange` for positions outside `0..len`, and
/// `TypeMismatch` for any other key type.
pub fn resolve_indices(keys: &Value, len: usize) -> Result<Vec<usize>> {
    match keys {
        Value::Slice(slice) => slice.indices(len),
        Value::IntegerArray(xs) => xs
            .iter()
            .map(|&k| {
                let norm = if k < 0 { k + len as i64 } else { k };
                if norm < 0 || norm >= len as i64 {
                    Err(Error::index_out_of_range(k, len))
                } else {
                    Ok(norm as usize)
                }
            })
            .collect(),
        other => Err(Error::type_mismatch("i or slice", other.value_type())),
    }
}

/// Elements of `target` at `keys`.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if any key is outside the target.
pub fn get_items(target: &Value, keys: &Value) -> Result<Value> {
    let indices = resolve_indices(keys, length(target)?)?;
    Ok(map_array!(target, col => col.gather(&indices)))
}

/// Writes `values` into `target` at `keys`, or replaces `target` entirely
/// when no keys are given.
///
/// `values` must share the target's typecode and either match the key
/// count or hold a single element to broadcast.
///
/// # Errors
///
/// Returns `TypeMismatch`, `IndexOutOfRange`, or `LengthMismatch`.
pub fn set_items(target: &Value, keys: Option<&Value>, values: &Value) -> Result<Value> {
    let Some(keys) = keys else {
        return Ok(zip_arrays!(target, values, _t, v => v.clone()));
    };
    let indices = resolve_indices(keys, length(target)?)?;
    let supplied = length(values)?;
    if supplied != 1 && supplied != indices.len() {
        return Err(Error::length_mismatch(indices.len(), supplied));
    }
    Ok(zip_arrays!(target, values, t, v => {
        let mut out = t.clone();
        out.assign(&indices, v);
        out
    }))
}

/// `target` with the elements at `keys` removed.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if any key is outside the target.
pub fn delete_items(target: &Value, keys: &Value) -> Result<Value> {
    let len = length(target)?;
    let doomed: BTreeSet<usize> = resolve_indices(keys, len)?.into_iter().collect();
    let keep: Vec<usize> = (0..len).filter(|i| !doomed.contains(i)).collect();
    Ok(map_array!(target, col => col.gather(&keep)))
}

/// `target` truncated or zero-padded to `len` elements.
///
/// # Errors
///
/// Returns `TypeMismatch` for non-array values and `InvalidInput` if the
/// result would exceed [`MAX_ARRAY_BYTES`](crate::MAX_ARRAY_BYTES).
pub fn set_length(target: &Value, len: usize) -> Result<Value> {
    check_array_size(len, element_width(target))?;
    Ok(map_array!(target, col => col.resized(len)))
}

/// Concatenates two arrays.
///
/// Numeric and Ed25519 arrays of the same typecode are appended. Byte
/// arrays are joined row-wise: row `i` of the result is row `i` of `a`
/// followed by row `i` of `b`, giving width `a + b`.
///
/// # Errors
///
/// Returns `TypeMismatch` for incompatible typecodes and `LengthMismatch`
/// for byte arrays of different lengths.
pub fn concat(a: &Value, b: &Value) -> Result<Value> {
    if let (Value::ByteArrayArray(x), Value::ByteArrayArray(y)) = (a, b) {
        if x.len() != y.len() {
            return Err(Error::length_mismatch(x.len(), y.len()));
        }
        let mut out = ByteRows::new(x.width() + y.width())?;
        for (left, right) in x.rows().zip(y.rows()) {
            out.push(&[left, right].concat())?;
        }
        return Ok(Value::ByteArrayArray(out));
    }
    Ok(zip_arrays!(a, b, x, y => x.appended(y)))
}

/// Elementwise choice: `iftrue[i]` where `cond[i]` is non-zero, else `iffalse[i]`.
///
/// # Errors
///
/// Returns `TypeMismatch` if the branches differ in typecode and
/// `LengthMismatch` if the three lengths differ.
pub fn select(cond: &Value, iftrue: &Value, iffalse: &Value) -> Result<Value> {
    let cond = cond.ints()?;
    let (t_len, f_len) = (length(iftrue)?, length(iffalse)?);
    if t_len != f_len {
        return Err(Error::length_mismatch(t_len, f_len));
    }
    if cond.len() != t_len {
        return Err(Error::length_mismatch(cond.len(), t_len));
    }
    Ok(zip_arrays!(iftrue, iffalse, t, f => {
        let mut out = t.clone();
        let falses: Vec<usize> = (0..cond.len()).filter(|&i| cond[i] == 0).collect();
        out.assign(&falses, &f.gather(&falses));
        out
    }))
}

/// Broadcasts a one-element array to `len` elements.
///
/// # Errors
///
/// Returns `InvalidInput` if the array does not have exactly one element
/// or the result would exceed [`MAX_ARRAY_BYTES`](crate::MAX_ARRAY_BYTES).
pub fn broadcast(value: &Value, len: usize) -> Result<Value> {
    let have = length(value)?;
    if have != 1 {
        return Err(Error::invalid_input(format!(
            "cannot broadcast an array of {have} elements"
        )));
    }
    // The gather index buffer is at least as large as the result.
    check_array_size(len, element_width(value).max(size_of::<usize>()))?;
    let zeros = vec![0; len];
    Ok(map_array!(value, col => col.gather(&zeros)))
}

/// The common length of a set of broadcast operands: the largest length
/// other than 1, or 1 if every length is 1.
#[must_use]
pub fn broadcast_length(lengths: &[i64]) -> i64 {
    lengths
        .iter()
        .copied()
        .filter(|&n| n != 1)
        .max()
        .unwrap_or(1)
}

// =============================================================================
// Ordering and search
// =============================================================================

/// Stable argsort: positions that would sort the array, ties broken by position.
///
/// # Errors
///
/// Returns `TypeMismatch` for non-array values.
pub fn argsort(value: &Value, descending: bool) -> Result<Vec<usize>> {
    let mut order: Vec<usize> = (0..length(value)?).collect();
    with_array!(value, col => order.sort_by(|&a, &b| {
        let ord = col.cmp_at(a, b);
        if descending { ord.reverse() } else { ord }
    }));
    Ok(order)
}

/// The array sorted stably, ascending unless `descending`.
///
/// # Errors
///
/// Returns `TypeMismatch` for non-array values.
pub fn sorted(value: &Value, descending: bool) -> Result<Value> {
    let order = argsort(value, descending)?;
    Ok(map_array!(value, col => col.gather(&order)))
}

/// Position of the first element of `target` equal to each element of
/// `values`, or `-1` when absent.
///
/// # Errors
///
/// Returns `TypeMismatch` unless both arrays share a typecode.
pub fn index_of(target: &Value, values: &Value) -> Result<Vec<i64>> {
    Ok(zip_with!(target, values, t, v => {
        let mut first: HashMap<Vec<u8>, usize> = HashMap::new();
        for i in (0..t.column_len()).rev() {
            first.insert(t.key_at(i), i);
        }
        (0..v.column_len())
            .map(|i| first.get(&v.key_at(i)).map_or(-1, |&p| p as i64))
            .collect()
    }))
}

/// 1 where the element of `values` occurs in `target`, else 0.
///
/// Defined through [`index_of`], so the two always agree.
///
/// # Errors
///
/// Returns `TypeMismatch` unless both arrays share a typecode.
pub fn contains(target: &Value, values: &Value) -> Result<Vec<i64>> {
    Ok(index_of(target, values)?
        .into_iter()
        .map(|p| i64::from(p >= 0))
        .collect())
}

/// Positional lookup: `target[keys[i]]`, or the one-element `default`
/// for keys outside the target.
///
/// # Errors
///
/// Returns `IndexOutOfRange` on a miss with no default, and `TypeMismatch`
/// if the default's typecode differs from the target's.
pub fn lookup(target: &Value, keys: &Value, default: Option<&Value>) -> Result<Value> {
    let len = length(target)?;
    let keys = keys.ints()?;
    let Some(default) = default else {
        return get_items(target, &Value::IntegerArray(keys.to_vec()));
    };
    if length(default)? != 1 {
        return Err(Error::invalid_input("lookup default must have one element"));
    }
    Ok(zip_arrays!(target, default, t, d => {
        let joined = t.appended(d);
        let picks: Vec<usize> = keys
            .iter()
            .map(|&k| {
                let norm = if k < 0 { k + len as i64 } else { k };
                if norm < 0 || norm >= len as i64 { len } else { norm as usize }
            })
            .collect();
        joined.gather(&picks)
    }))
}

/// Positions of non-zero elements.
///
/// # Errors
///
/// Returns `TypeMismatch` for non-array values.
pub fn nonzero_indices(value: &Value) -> Result<Vec<i64>> {
    let len = length(value)?;
    Ok(with_array!(value, col => positions((0..len).filter(|&i| !col.zero_at(i)))))
}

/// True if every element is non-zero (vacuously true when empty).
///
/// # Errors
///
/// Returns `TypeMismatch` for non-array values.
pub fn all_nonzero(value: &Value) -> Result<bool> {
    let len = length(value)?;
    Ok(with_array!(value, col => (0..len).all(|i| !col.zero_at(i))))
}

/// Whole-value equality of two integer arrays.
///
/// # Errors
///
/// Returns `TypeMismatch` if either operand is not an `i` array.
pub fn equal_ints(a: &Value, b: &Value) -> Result<bool> {
    Ok(a.ints()? == b.ints()?)
}

// =============================================================================
// Accumulation
// =============================================================================

/// Running totals. Integer sums are checked; byte rows accumulate by OR.
///
/// # Errors
///
/// Returns `Overflow` for integer overflow and `TypeMismatch` for Ed25519 arrays.
pub fn cumsum(value: &Value) -> Result<Value> {
    match value {
        Value::IntegerArray(xs) => {
            let mut acc = 0i64;
            let mut out = Vec::with_capacity(xs.len());
            for x in xs {
                acc = acc.checked_add(*x).ok_or_else(|| Error::overflow("cumsum"))?;
                out.push(acc);
            }
            Ok(Value::IntegerArray(out))
        }
        Value::FloatArray(xs) => Ok(Value::FloatArray(
            xs.iter()
                .scan(0.0, |acc, x| {
                    *acc += x;
                    Some(*acc)
                })
                .collect(),
        )),
        Value::ByteArrayArray(rows) => {
            let mut acc = vec![0u8; rows.width()];
            let mut out = ByteRows::new(rows.width())?;
            for row in rows.rows() {
                for (a, b) in acc.iter_mut().zip(row) {
                    *a |= b;
                }
                out.push(&acc)?;
            }
            Ok(Value::ByteArrayArray(out))
        }
        other => Err(Error::type_mismatch("i, f, or bN", other.value_type())),
    }
}

/// Whole-array reduction operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    /// Sum (checked for integers).
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
}

impl FromStr for ReduceOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "xor" => Ok(Self::Xor),
            other => Err(Error::invalid_input(format!("unknown reduction: {other}"))),
        }
    }
}

fn fold_ints(xs: &[i64], op: ReduceOp) -> Result<i64> {
    match op {
        ReduceOp::Sum => xs.iter().try_fold(0i64, |acc, &x| {
            acc.checked_add(x).ok_or_else(|| Error::overflow("reduce sum"))
        }),
        ReduceOp::Min => xs.iter().copied().min().ok_or_else(empty_reduce),
        ReduceOp::Max => xs.iter().copied().max().ok_or_else(empty_reduce),
        ReduceOp::And => Ok(xs.iter().fold(-1, |acc, x| acc & x)),
        ReduceOp::Or => Ok(xs.iter().fold(0, |acc, x| acc | x)),
        ReduceOp::Xor => Ok(xs.iter().fold(0, |acc, x| acc ^ x)),
    }
}

fn empty_reduce() -> Error {
    Error::invalid_input("cannot take min or max of an empty array")
}

/// Reduces an array to a one-element array of the same typecode.
///
/// # Errors
///
/// Returns `Overflow` for integer overflow, `InvalidInput` for min/max of
/// an empty array, and `TypeMismatch` for operators the typecode lacks.
pub fn reduce(value: &Value, op: ReduceOp) -> Result<Value> {
    match value {
        Value::IntegerArray(xs) => Ok(Value::IntegerArray(vec![fold_ints(xs, op)?])),
        Value::FloatArray(xs) => {
            let out: f64 = match op {
                ReduceOp::Sum => xs.iter().sum(),
                ReduceOp::Min => xs.iter().copied().min_by(f64::total_cmp).ok_or_else(empty_reduce)?,
                ReduceOp::Max => xs.iter().copied().max_by(f64::total_cmp).ok_or_else(empty_reduce)?,
                ReduceOp::And | ReduceOp::Or | ReduceOp::Xor => {
                    return Err(Error::type_mismatch("i or bN", value.value_type()));
                }
            };
            Ok(Value::FloatArray(vec![out]))
        }
        Value::ByteArrayArray(rows) => {
            let width = rows.width();
            let row = match op {
                ReduceOp::Min => rows.rows().min().ok_or_else(empty_reduce)?.to_vec(),
                ReduceOp::Max => rows.rows().max().ok_or_else(empty_reduce)?.to_vec(),
                ReduceOp::And => rows.rows().fold(vec![0xff; width], |acc, r| {
                    acc.iter().zip(r).map(|(a, b)| a & b).collect()
                }),
                ReduceOp::Or | ReduceOp::Sum => rows.rows().fold(vec![0; width], |acc, r| {
                    acc.iter().zip(r).map(|(a, b)| a | b).collect()
                }),
                ReduceOp::Xor => rows.rows().fold(vec![0; width], |acc, r| {
                    acc.iter().zip(r).map(|(a, b)| a ^ b).collect()
                }),
            };
            Ok(Value::ByteArrayArray(ByteRows::from_flat(width, row)?))
        }
        other => Err(Error::type_mismatch("i, f, or bN", other.value_type())),
    }
}

/// Combining operators for [`scatter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterOp {
    /// Addition (OR for byte rows).
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
}

/// Scatter-reduces `values` into `target` at `keys`.
///
/// With `accumulate`, each touched element folds into the target's
/// current value. Without it, the first write to an element overwrites it
/// and later writes to the same element fold in.
///
/// # Errors
///
/// Returns `LengthMismatch` if keys and values differ in length,
/// `IndexOutOfRange` for bad keys, `Overflow` for integer overflow, and
/// `TypeMismatch` if target and values differ in typecode.
pub fn scatter(
    target: &Value,
    keys: &Value,
    values: &Value,
    op: ScatterOp,
    accumulate: bool,
) -> Result<Value> {
    let key_count = length(keys)?;
    let value_count = length(values)?;
    if key_count != value_count {
        return Err(Error::length_mismatch(key_count, value_count));
    }
    let indices = resolve_indices(keys, length(target)?)?;
    let mut touched = vec![accumulate; length(target)?];

    match (target, values) {
        (Value::IntegerArray(t), Value::IntegerArray(v)) => {
            let mut out = t.clone();
            for (n, &i) in indices.iter().enumerate() {
                out[i] = if touched[i] {
                    match op {
                        ScatterOp::Sum => out[i]
                            .checked_add(v[n])
                            .ok_or_else(|| Error::overflow("scatter sum"))?,
                        ScatterOp::Min => out[i].min(v[n]),
                        ScatterOp::Max => out[i].max(v[n]),
                    }
                } else {
                    v[n]
                };
                touched[i] = true;
            }
            Ok(Value::IntegerArray(out))
        }
        (Value::FloatArray(t), Value::FloatArray(v)) => {
            let mut out = t.clone();
            for (n, &i) in indices.iter().enumerate() {
                out[i] = if touched[i] {
                    match op {
                        ScatterOp::Sum => out[i] + v[n],
                        ScatterOp::Min => out[i].min(v[n]),
                        ScatterOp::Max => out[i].max(v[n]),
                    }
                } else {
                    v[n]
                };
                touched[i] = true;
            }
            Ok(Value::FloatArray(out))
        }
        (Value::ByteArrayArray(t), Value::ByteArrayArray(v)) if t.width() == v.width() => {
            let mut out = t.clone();
            for (n, &i) in indices.iter().enumerate() {
                let incoming = v.row(n).unwrap_or_default();
                let current = out.row(i).unwrap_or_default();
                let next: Vec<u8> = if touched[i] {
                    match op {
                        ScatterOp::Sum => current.iter().zip(incoming).map(|(a, b)| a | b).collect(),
                        ScatterOp::Min => current.min(incoming).to_vec(),
                        ScatterOp::Max => current.max(incoming).to_vec(),
                    }
                } else {
                    incoming.to_vec()
                };
                out.set_row(i, &next);
                touched[i] = true;
            }
            Ok(Value::ByteArrayArray(out))
        }
        (a, b) => Err(mismatch(a, b)),
    }
}

// =============================================================================
// Byte projection
// =============================================================================

/// Builds rows of `width` bytes where byte `dest[k]` of each output row is
/// byte `src[k]` of the matching source row. Unmapped bytes are zero.
///
/// # Errors
///
/// Returns `LengthMismatch` if the mappings differ in length and
/// `IndexOutOfRange` if a mapping points outside either row.
pub fn byte_project(source: &Value, width: usize, dest: &Value, src: &Value) -> Result<Value> {
    let rows = source.byte_array()?;
    let (dest, src) = (dest.ints()?, src.ints()?);
    if dest.len() != src.len() {
        return Err(Error::length_mismatch(dest.len(), src.len()));
    }
    let dest = resolve_indices(&Value::IntegerArray(dest.to_vec()), width)?;
    let src = resolve_indices(&Value::IntegerArray(src.to_vec()), rows.width())?;

    let mut out = ByteRows::new(width)?;
    let mut buf = vec![0u8; width];
    for row in rows.rows() {
        buf.fill(0);
        for (&d, &s) in dest.iter().zip(&src) {
            buf[d] = row[s];
        }
        out.push(&buf)?;
    }
    Ok(Value::ByteArrayArray(out))
}
