//! Typecodes and value type descriptors.
//!
//! A typecode is the explicit tag stored alongside array data:
//!
//! | Code | Element | Width |
//! |------|---------|-------|
//! | `i`  | `i64`   | 8     |
//! | `f`  | `f64`   | 8     |
//! | `bN` | `[u8; N]` | N   |
//! | `I`  | Ed25519 scalar | 32 |
//! | `E`  | Ed25519 point | 64 |

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Width in bytes of an Ed25519 scalar.
pub const ED25519_SCALAR_WIDTH: usize = 32;

/// Width in bytes of an Ed25519 point (two 32-byte coordinates).
pub const ED25519_POINT_WIDTH: usize = 64;

/// Element typecode for homogeneous arrays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TypeCode {
    /// 64-bit signed integers (`i`).
    Integer,
    /// 64-bit floats (`f`).
    Float,
    /// Fixed-width byte rows (`bN`).
    ByteArray(usize),
    /// Ed25519 scalars (`I`).
    Ed25519Int,
    /// Ed25519 points (`E`).
    Ed25519,
}

impl TypeCode {
    /// Width in bytes of one element.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Integer | Self::Float => 8,
            Self::ByteArray(n) => n,
            Self::Ed25519Int => ED25519_SCALAR_WIDTH,
            Self::Ed25519 => ED25519_POINT_WIDTH,
        }
    }

    /// Returns true for typecodes whose elements are raw bytes.
    #[must_use]
    pub const fn is_byte_oriented(self) -> bool {
        matches!(self, Self::ByteArray(_) | Self::Ed25519Int | Self::Ed25519)
    }

    /// Returns true for `i` and `f`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Parses a run of concatenated typecodes such as `"ib8f"`.
    ///
    /// Used for list-map key layouts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTypeCode` if any part of the text is not a typecode
    /// or the text is empty.
    pub fn parse_many(text: &str) -> Result<Vec<Self>, Error> {
        let invalid = || Error::new(ErrorKind::InvalidTypeCode(text.to_string()));
        let bytes = text.as_bytes();
        let mut codes = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let code = match bytes[pos] {
                b'i' => Self::Integer,
                b'f' => Self::Float,
                b'I' => Self::Ed25519Int,
                b'E' => Self::Ed25519,
                b'b' => {
                    let digits = bytes[pos + 1..]
                        .iter()
                        .take_while(|b| b.is_ascii_digit())
                        .count();
                    let number = &text[pos + 1..pos + 1 + digits];
                    if number.is_empty() || number.starts_with('0') {
                        return Err(invalid());
                    }
                    let width = number.parse().map_err(|_| invalid())?;
                    pos += digits;
                    Self::ByteArray(width)
                }
                _ => return Err(invalid()),
            };
            codes.push(code);
            pos += 1;
        }

        if codes.is_empty() {
            return Err(invalid());
        }
        Ok(codes)
    }
}

impl FromStr for TypeCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse_many(s)?.as_slice() {
            [code] => Ok(*code),
            _ => Err(Error::new(ErrorKind::InvalidTypeCode(s.to_string()))),
        }
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "i"),
            Self::Float => write!(f, "f"),
            Self::ByteArray(n) => write!(f, "b{n}"),
            Self::Ed25519Int => write!(f, "I"),
            Self::Ed25519 => write!(f, "E"),
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Describes the shape of any [`Value`](crate::Value), arrays and aggregates alike.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    /// A homogeneous array.
    Array(TypeCode),
    /// A list-map whose composite keys follow the given column typecodes.
    ListMap(Vec<TypeCode>),
    /// A pair of values.
    Pair,
    /// An arena-backed node tree.
    Node,
    /// A lazy slice descriptor.
    Slice,
}

impl ValueType {
    /// Returns the array typecode, if this is an array type.
    #[must_use]
    pub const fn typecode(&self) -> Option<TypeCode> {
        match self {
            Self::Array(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(code) => write!(f, "{code}"),
            Self::ListMap(codes) => {
                write!(f, "listmap<")?;
                for code in codes {
                    write!(f, "{code}")?;
                }
                write!(f, ">")
            }
            Self::Pair => write!(f, "pair"),
            Self::Node => write!(f, "node"),
            Self::Slice => write!(f, "slice"),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Operand count specification for commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly N operands.
    Exact(usize),
    /// Between min and max operands (inclusive).
    Range(usize, usize),
    /// At least N operands, then any number more.
    Variadic(usize),
}

impl Arity {
    /// Checks whether `count` operands satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => count >= min && count <= max,
            Self::Variadic(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(min, max) => write!(f, "{min}..={max}"),
            Self::Variadic(min) => write!(f, "{min}+"),
        }
    }
}
