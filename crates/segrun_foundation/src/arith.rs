//! Elementwise operators.
//!
//! Both operands must share a typecode. A one-element operand broadcasts
//! against a longer one. Integer arithmetic is checked and fails with
//! `Overflow`, except for the explicit wrapping forms `wadd`, `wsub` and
//! `wmul`. Integer shifts discard the bits they push out.

#![allow(clippy::cast_precision_loss)]

use std::str::FromStr;

use crate::Result;
use crate::array::mismatch;
use crate::error::{Error, ErrorKind};
use crate::rows::ByteRows;
use crate::typecode::{TypeCode, ValueType};
use crate::value::Value;

/// Two-operand operators, named after their opcodes.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    TrueDiv,
    Mod,
    Pow,
    WrappingAdd,
    WrappingSub,
    WrappingMul,
    LShift,
    RShift,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl BinaryOp {
    /// Every binary operator, for registration.
    pub const ALL: [Self; 21] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::FloorDiv,
        Self::TrueDiv,
        Self::Mod,
        Self::Pow,
        Self::WrappingAdd,
        Self::WrappingSub,
        Self::WrappingMul,
        Self::LShift,
        Self::RShift,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Ge,
        Self::Le,
    ];

    /// The opcode this operator is invoked by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::FloorDiv => "floordiv",
            Self::TrueDiv => "truediv",
            Self::Mod => "mod",
            Self::Pow => "pow",
            Self::WrappingAdd => "wadd",
            Self::WrappingSub => "wsub",
            Self::WrappingMul => "wmul",
            Self::LShift => "lshift",
            Self::RShift => "rshift",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
        }
    }

    const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Lt | Self::Ge | Self::Le
        )
    }
}

impl FromStr for BinaryOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::unknown_opcode(s))
    }
}

/// One-operand operators, named after their opcodes.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Abs,
    Invert,
    Floor,
    Ceil,
    Round,
    Trunc,
    Nearest,
    Exp,
    Log,
    Sin,
    Cos,
}

impl UnaryOp {
    /// Every unary operator, for registration.
    pub const ALL: [Self; 12] = [
        Self::Neg,
        Self::Abs,
        Self::Invert,
        Self::Floor,
        Self::Ceil,
        Self::Round,
        Self::Trunc,
        Self::Nearest,
        Self::Exp,
        Self::Log,
        Self::Sin,
        Self::Cos,
    ];

    /// The opcode this operator is invoked by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Abs => "abs",
            Self::Invert => "invert",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Trunc => "trunc",
            Self::Nearest => "nearest",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sin => "sin",
            Self::Cos => "cos",
        }
    }
}

impl FromStr for UnaryOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::unknown_opcode(s))
    }
}

/// Pairs elements of `a` and `b`, broadcasting a one-element side.
fn zip_broadcast<T: Copy, U>(
    a: &[T],
    b: &[T],
    mut f: impl FnMut(T, T) -> Result<U>,
) -> Result<Vec<U>> {
    let len = match (a.len(), b.len()) {
        (x, y) if x == y => x,
        (1, y) => y,
        (x, 1) => x,
        (x, y) => return Err(Error::length_mismatch(x, y)),
    };
    (0..len)
        .map(|i| {
            let x = if a.len() == 1 { a[0] } else { a[i] };
            let y = if b.len() == 1 { b[0] } else { b[i] };
            f(x, y)
        })
        .collect()
}

fn not_for(op: &str, value: &Value) -> Error {
    Error::type_mismatch(format!("an operand supporting {op}"), value.value_type())
}

fn compare<T: PartialOrd>(op: BinaryOp, x: T, y: T) -> i64 {
    i64::from(match op {
        BinaryOp::Eq => x == y,
        BinaryOp::Ne => x != y,
        BinaryOp::Gt => x > y,
        BinaryOp::Lt => x < y,
        BinaryOp::Ge => x >= y,
        _ => x <= y,
    })
}

/// Floor division rounding towards negative infinity.
fn floor_div(x: i64, y: i64) -> Result<i64> {
    if y == 0 {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    let q = x.checked_div(y).ok_or_else(|| Error::overflow("floordiv"))?;
    Ok(if x % y != 0 && ((x < 0) != (y < 0)) { q - 1 } else { q })
}

/// Remainder taking the sign of the divisor.
fn floor_mod(x: i64, y: i64) -> Result<i64> {
    if y == 0 {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    let r = x.checked_rem(y).ok_or_else(|| Error::overflow("mod"))?;
    Ok(if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r })
}

fn shift_amount(y: i64) -> Result<u32> {
    u32::try_from(y)
        .ok()
        .filter(|&s| s < 64)
        .ok_or_else(|| Error::invalid_input(format!("shift amount {y} out of range")))
}

fn int_op(op: BinaryOp, x: i64, y: i64) -> Result<i64> {
    let checked = |r: Option<i64>| r.ok_or_else(|| Error::overflow(op.name()));
    match op {
        BinaryOp::Add => checked(x.checked_add(y)),
        BinaryOp::Sub => checked(x.checked_sub(y)),
        BinaryOp::Mul => checked(x.checked_mul(y)),
        BinaryOp::FloorDiv => floor_div(x, y),
        BinaryOp::Mod => floor_mod(x, y),
        BinaryOp::Pow => {
            let exp = u32::try_from(y)
                .map_err(|_| Error::invalid_input(format!("negative exponent {y}")))?;
            checked(x.checked_pow(exp))
        }
        BinaryOp::WrappingAdd => Ok(x.wrapping_add(y)),
        BinaryOp::WrappingSub => Ok(x.wrapping_sub(y)),
        BinaryOp::WrappingMul => Ok(x.wrapping_mul(y)),
        BinaryOp::LShift => Ok(x << shift_amount(y)?),
        BinaryOp::RShift => Ok(x >> shift_amount(y)?),
        BinaryOp::And => Ok(x & y),
        BinaryOp::Or => Ok(x | y),
        BinaryOp::Xor => Ok(x ^ y),
        BinaryOp::TrueDiv => Err(Error::internal("truediv on the integer path")),
        _ => Ok(compare(op, x, y)),
    }
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> Result<f64> {
    let nonzero = || {
        if y == 0.0 {
            Err(Error::new(ErrorKind::DivisionByZero))
        } else {
            Ok(())
        }
    };
    match op {
        BinaryOp::Add => Ok(x + y),
        BinaryOp::Sub => Ok(x - y),
        BinaryOp::Mul => Ok(x * y),
        BinaryOp::TrueDiv => nonzero().map(|()| x / y),
        BinaryOp::FloorDiv => nonzero().map(|()| (x / y).floor()),
        BinaryOp::Mod => nonzero().map(|()| x - y * (x / y).floor()),
        BinaryOp::Pow => Ok(x.powf(y)),
        _ => Err(Error::type_mismatch(
            format!("an operand supporting {}", op.name()),
            ValueType::Array(TypeCode::Float),
        )),
    }
}

fn bytes_op(op: BinaryOp, a: &ByteRows, b: &ByteRows) -> Result<Value> {
    let ra: Vec<&[u8]> = a.rows().collect();
    let rb: Vec<&[u8]> = b.rows().collect();
    if op.is_comparison() {
        if !matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            return Err(Error::invalid_input(format!(
                "byte rows only support eq and ne, not {}",
                op.name()
            )));
        }
        return zip_broadcast(&ra, &rb, |x, y| Ok(compare(op, x, y))).map(Value::IntegerArray);
    }
    let combine: fn(u8, u8) -> u8 = match op {
        BinaryOp::And => |x, y| x & y,
        BinaryOp::Or => |x, y| x | y,
        BinaryOp::Xor => |x, y| x ^ y,
        _ => {
            return Err(Error::invalid_input(format!(
                "byte rows do not support {}",
                op.name()
            )));
        }
    };
    let joined = zip_broadcast(&ra, &rb, |x, y| {
        Ok(x.iter().zip(y).map(|(p, q)| combine(*p, *q)).collect::<Vec<u8>>())
    })?;
    Ok(Value::ByteArrayArray(ByteRows::from_rows(a.width(), joined)?))
}

/// Applies a binary operator elementwise.
///
/// Comparisons always produce an `i` array of 0/1. `truediv` on integers
/// produces floats.
///
/// # Errors
///
/// Returns `TypeMismatch` if the operands differ in typecode or the
/// typecode lacks the operator, `LengthMismatch` for incompatible lengths,
/// `DivisionByZero`, and `Overflow` from checked integer arithmetic.
pub fn binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::IntegerArray(x), Value::IntegerArray(y)) => {
            if op == BinaryOp::TrueDiv {
                return zip_broadcast(x, y, |p, q| float_op(op, p as f64, q as f64))
                    .map(Value::FloatArray);
            }
            zip_broadcast(x, y, |p, q| int_op(op, p, q)).map(Value::IntegerArray)
        }
        (Value::FloatArray(x), Value::FloatArray(y)) => {
            if op.is_comparison() {
                return zip_broadcast(x, y, |p, q| Ok(compare(op, p, q))).map(Value::IntegerArray);
            }
            if matches!(
                op,
                BinaryOp::WrappingAdd
                    | BinaryOp::WrappingSub
                    | BinaryOp::WrappingMul
                    | BinaryOp::LShift
                    | BinaryOp::RShift
                    | BinaryOp::And
                    | BinaryOp::Or
                    | BinaryOp::Xor
            ) {
                return Err(not_for(op.name(), a));
            }
            zip_broadcast(x, y, |p, q| float_op(op, p, q)).map(Value::FloatArray)
        }
        (Value::ByteArrayArray(x), Value::ByteArrayArray(y)) if x.width() == y.width() => {
            bytes_op(op, x, y)
        }
        (Value::Ed25519IntArray(x), Value::Ed25519IntArray(y))
        | (Value::Ed25519Array(x), Value::Ed25519Array(y))
            if matches!(op, BinaryOp::Eq | BinaryOp::Ne) =>
        {
            bytes_op(op, x, y)
        }
        (Value::IntegerArray(_) | Value::FloatArray(_) | Value::ByteArrayArray(_), _) => {
            Err(mismatch(a, b))
        }
        _ => Err(not_for(op.name(), a)),
    }
}

/// `(floordiv(a, b), mod(a, b))` as a pair.
///
/// # Errors
///
/// As for [`binary`].
pub fn divmod(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::pair(
        binary(BinaryOp::FloorDiv, a, b)?,
        binary(BinaryOp::Mod, a, b)?,
    ))
}

/// Applies a unary operator elementwise.
///
/// Rounding operators are the identity on integers. `invert` flips every
/// bit of integers and byte rows.
///
/// # Errors
///
/// Returns `TypeMismatch` if the typecode lacks the operator and
/// `Overflow` when negating or taking the absolute value of `i64::MIN`.
pub fn unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match value {
        Value::IntegerArray(xs) => {
            let out = xs.iter().map(|&x| match op {
                UnaryOp::Neg => x.checked_neg().ok_or_else(|| Error::overflow("neg")),
                UnaryOp::Abs => x.checked_abs().ok_or_else(|| Error::overflow("abs")),
                UnaryOp::Invert => Ok(!x),
                UnaryOp::Floor
                | UnaryOp::Ceil
                | UnaryOp::Round
                | UnaryOp::Trunc
                | UnaryOp::Nearest => Ok(x),
                UnaryOp::Exp | UnaryOp::Log | UnaryOp::Sin | UnaryOp::Cos => {
                    Err(not_for(op.name(), value))
                }
            });
            out.collect::<Result<Vec<_>>>().map(Value::IntegerArray)
        }
        Value::FloatArray(xs) => {
            let f: fn(f64) -> f64 = match op {
                UnaryOp::Neg => |x| -x,
                UnaryOp::Abs => f64::abs,
                UnaryOp::Floor => f64::floor,
                UnaryOp::Ceil => f64::ceil,
                UnaryOp::Round => f64::round,
                UnaryOp::Trunc => f64::trunc,
                UnaryOp::Nearest => f64::round_ties_even,
                UnaryOp::Exp => f64::exp,
                UnaryOp::Log => f64::ln,
                UnaryOp::Sin => f64::sin,
                UnaryOp::Cos => f64::cos,
                UnaryOp::Invert => return Err(not_for(op.name(), value)),
            };
            Ok(Value::FloatArray(xs.iter().map(|&x| f(x)).collect()))
        }
        Value::ByteArrayArray(rows) if op == UnaryOp::Invert => {
            let flipped = rows.as_bytes().iter().map(|b| !b).collect();
            Ok(Value::ByteArrayArray(ByteRows::from_flat(rows.width(), flipped)?))
        }
        other => Err(not_for(op.name(), other)),
    }
}
