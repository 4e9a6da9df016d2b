//! Typecode conversion (`astype`).
//!
//! Conversions never reinterpret bytes silently: every supported pair has an
//! explicit encoding, and everything else is a `TypeMismatch`.
//!
//! | from | to | rule |
//! |---|---|---|
//! | `i` | `f` | numeric widening |
//! | `i` | `bN`, N ≥ 8 | little-endian, sign-extended |
//! | `i` | `I` | little-endian scalar; negatives rejected |
//! | `bN` | `bM`, M ≥ N | zero-padded on the right |
//! | `b8` | `i` | little-endian |
//! | `b32` | `I` | rows reused as scalars |
//! | `I` | `i` | little-endian, must fit in 63 bits |
//! | `I` | `b32` | rows reused as bytes |
//!
//! Every typecode converts to itself.

use crate::Result;
use crate::error::Error;
use crate::rows::ByteRows;
use crate::typecode::{ED25519_SCALAR_WIDTH, TypeCode};
use crate::value::Value;

fn unsupported(value: &Value, to: TypeCode) -> Error {
    Error::type_mismatch(format!("a value convertible to {to}"), value.value_type())
}

/// Converts an array to `to`.
///
/// # Errors
///
/// Returns `TypeMismatch` for unsupported conversions and `InvalidInput`
/// when a particular element cannot be represented in the target.
pub fn astype(value: &Value, to: TypeCode) -> Result<Value> {
    if value.typecode() == Some(to) {
        return Ok(value.clone());
    }
    match (value, to) {
        #[allow(clippy::cast_precision_loss)]
        (Value::IntegerArray(xs), TypeCode::Float) => {
            Ok(Value::FloatArray(xs.iter().map(|&x| x as f64).collect()))
        }
        (Value::IntegerArray(xs), TypeCode::ByteArray(width)) if width >= 8 => {
            let mut out = ByteRows::new(width)?;
            let mut row = vec![0u8; width];
            for x in xs {
                row[..8].copy_from_slice(&x.to_le_bytes());
                row[8..].fill(if *x < 0 { 0xff } else { 0 });
                out.push(&row)?;
            }
            Ok(Value::ByteArrayArray(out))
        }
        (Value::IntegerArray(xs), TypeCode::Ed25519Int) => {
            let mut out = ByteRows::new(ED25519_SCALAR_WIDTH)?;
            let mut row = [0u8; ED25519_SCALAR_WIDTH];
            for x in xs {
                if *x < 0 {
                    return Err(Error::invalid_input(format!(
                        "negative integer {x} has no scalar encoding"
                    )));
                }
                row[..8].copy_from_slice(&x.to_le_bytes());
                out.push(&row)?;
            }
            Value::ed25519_ints(out)
        }
        (Value::ByteArrayArray(rows), TypeCode::ByteArray(width)) if width >= rows.width() => {
            let mut out = ByteRows::new(width)?;
            let mut buf = vec![0u8; width];
            for row in rows.rows() {
                buf[..row.len()].copy_from_slice(row);
                out.push(&buf)?;
            }
            Ok(Value::ByteArrayArray(out))
        }
        (Value::ByteArrayArray(rows), TypeCode::Integer) if rows.width() == 8 => Ok(
            Value::IntegerArray(rows.rows().map(le_i64).collect()),
        ),
        (Value::ByteArrayArray(rows), TypeCode::Ed25519Int)
            if rows.width() == ED25519_SCALAR_WIDTH =>
        {
            Value::ed25519_ints(rows.clone())
        }
        (Value::Ed25519IntArray(rows), TypeCode::Integer) => rows
            .rows()
            .map(|row| {
                let x = le_i64(&row[..8]);
                if x < 0 || row[8..].iter().any(|&b| b != 0) {
                    Err(Error::invalid_input("scalar does not fit in an integer"))
                } else {
                    Ok(x)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::IntegerArray),
        (Value::Ed25519IntArray(rows), TypeCode::ByteArray(ED25519_SCALAR_WIDTH)) => {
            Ok(Value::ByteArrayArray(rows.clone()))
        }
        (other, to) => Err(unsupported(other, to)),
    }
}

fn le_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    i64::from_le_bytes(buf)
}
