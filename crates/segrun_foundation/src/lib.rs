//! Typecodes, values, and array operations for segrun.
//!
//! This crate provides:
//! - [`Value`] - The tagged value type held in a variable store
//! - [`TypeCode`] and [`ValueType`] - Element and value type descriptors
//! - [`ByteRows`] - Fixed-width byte rows backing `bN`, `I` and `E` arrays
//! - [`ListMap`] and [`NodeTree`] - Composite aggregates
//! - [`Error`] - Rich error types with context
//! - [`array`], [`arith`] and [`convert`] - Pure operations over values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arith;
pub mod array;
pub mod convert;
pub mod error;
pub mod listmap;
pub mod node;
pub mod rows;
pub mod slice;
pub mod typecode;
pub mod value;

pub use arith::{BinaryOp, UnaryOp};
pub use array::{ReduceOp, ScatterOp};
pub use error::{Error, ErrorContext, ErrorKind};
pub use listmap::{ListMap, Removal};
pub use node::{Node, NodeId, NodeTree};
pub use rows::ByteRows;
pub use slice::Slice;
pub use typecode::{Arity, ED25519_POINT_WIDTH, ED25519_SCALAR_WIDTH, TypeCode, ValueType};
pub use value::{MAX_ARRAY_BYTES, Value, check_array_size};

/// Result type alias using segrun's Error.
pub type Result<T> = std::result::Result<T, Error>;
