//! Command operands.
//!
//! An operand is either a reference to a variable in the session's store or
//! a literal. Literals become values only when a command reads them:
//!
//! | Literal | Value |
//! |---------|-------|
//! | `Int(x)` | one-element `i` |
//! | `Float(x)` | one-element `f` |
//! | `Ints(xs)` | `i` |
//! | `Floats(xs)` | `f` |
//! | `Bytes(v)` | one row of width `len(v)` |
//! | `Text(s)` | its UTF-8 bytes as one row |

use std::fmt;

use serde::{Deserialize, Serialize};

use segrun_foundation::{Error, Result, Value};

/// A single command operand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A variable name.
    Var(String),
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// A text literal. Also accepted wherever a name is expected.
    Text(String),
    /// A raw byte literal.
    Bytes(Vec<u8>),
    /// An integer array literal.
    Ints(Vec<i64>),
    /// A float array literal.
    Floats(Vec<f64>),
}

impl Operand {
    /// Creates a variable reference.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Creates a text literal.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the variable name if this is a `Var`.
    #[must_use]
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the operand as a name: a `Var`, or a `Text` literal.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Var(name) | Self::Text(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true for every operand that is not a `Var`.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        !matches!(self, Self::Var(_))
    }

    /// Builds the value a literal stands for.
    ///
    /// # Errors
    ///
    /// Returns `Internal` for a `Var` and `InvalidInput` for an empty byte
    /// or text literal.
    pub fn literal_value(&self) -> Result<Value> {
        match self {
            Self::Var(name) => Err(Error::internal(format!(
                "variable '{name}' is not a literal"
            ))),
            Self::Int(x) => Ok(Value::IntegerArray(vec![*x])),
            Self::Float(x) => Ok(Value::FloatArray(vec![*x])),
            Self::Ints(xs) => Ok(Value::IntegerArray(xs.clone())),
            Self::Floats(xs) => Ok(Value::FloatArray(xs.clone())),
            Self::Bytes(bytes) => Value::bytes(bytes),
            Self::Text(text) => Value::bytes(text.as_bytes()),
        }
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Self::Var(name.to_string())
    }
}

impl From<i64> for Operand {
    fn from(x: i64) -> Self {
        Self::Int(x)
    }
}

impl From<f64> for Operand {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "{name}"),
            Self::Int(x) => write!(f, "{x}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Bytes(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Ints(xs) => write!(f, "{xs:?}"),
            Self::Floats(xs) => write!(f, "{xs:?}"),
        }
    }
}
