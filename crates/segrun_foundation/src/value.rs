//! Core value type for all segrun data.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Result;
use crate::error::Error;
use crate::listmap::ListMap;
use crate::node::NodeTree;
use crate::rows::ByteRows;
use crate::slice::Slice;
use crate::typecode::{ED25519_POINT_WIDTH, ED25519_SCALAR_WIDTH, TypeCode, ValueType};

/// Largest payload, in bytes, of an array built from an operand-supplied length.
pub const MAX_ARRAY_BYTES: usize = 1 << 30;

/// Checks that `len` elements of `width` bytes stay within [`MAX_ARRAY_BYTES`],
/// returning the payload size.
///
/// # Errors
///
/// Returns `Overflow` if the size does not fit in `usize` and
/// `InvalidInput` past the limit.
pub fn check_array_size(len: usize, width: usize) -> Result<usize> {
    let bytes = len
        .checked_mul(width)
        .ok_or_else(|| Error::overflow("array size"))?;
    if bytes > MAX_ARRAY_BYTES {
        return Err(Error::invalid_input(format!(
            "array of {len} elements of {width} bytes exceeds {MAX_ARRAY_BYTES} bytes"
        )));
    }
    Ok(bytes)
}

/// Core value type stored in a session's variable store.
///
/// Every array variant is homogeneous. The typecode is carried by the
/// variant itself, plus the row width for byte-oriented arrays, so a
/// value's representation can never disagree with its typecode.
#[derive(Clone)]
pub enum Value {
    /// `i` array.
    IntegerArray(Vec<i64>),
    /// `f` array.
    FloatArray(Vec<f64>),
    /// `bN` array.
    ByteArrayArray(ByteRows),
    /// `I` array; rows are always 32 bytes.
    Ed25519IntArray(ByteRows),
    /// `E` array; rows are always 64 bytes.
    Ed25519Array(ByteRows),
    /// Insertion-ordered composite-key map.
    ListMap(ListMap),
    /// Two heterogeneous values.
    Pair(Box<Value>, Box<Value>),
    /// Arena-backed labeled tree.
    Node(NodeTree),
    /// Lazy index range.
    Slice(Slice),
}

impl Value {
    /// Creates a one-row byte array from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `bytes` is empty.
    pub fn bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::ByteArrayArray(ByteRows::from_flat(
            bytes.len(),
            bytes.to_vec(),
        )?))
    }

    /// Creates an `I` array, checking the row width.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the rows are not 32 bytes wide.
    pub fn ed25519_ints(rows: ByteRows) -> Result<Self> {
        if rows.width() != ED25519_SCALAR_WIDTH {
            return Err(Error::invalid_input(format!(
                "Ed25519 scalars are {ED25519_SCALAR_WIDTH} bytes, got {}",
                rows.width()
            )));
        }
        Ok(Self::Ed25519IntArray(rows))
    }

    /// Creates an `E` array, checking the row width.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the rows are not 64 bytes wide.
    pub fn ed25519_points(rows: ByteRows) -> Result<Self> {
        if rows.width() != ED25519_POINT_WIDTH {
            return Err(Error::invalid_input(format!(
                "Ed25519 points are {ED25519_POINT_WIDTH} bytes, got {}",
                rows.width()
            )));
        }
        Ok(Self::Ed25519Array(rows))
    }

    /// Creates a pair.
    #[must_use]
    pub fn pair(first: Value, second: Value) -> Self {
        Self::Pair(Box::new(first), Box::new(second))
    }

    /// Creates a zero-filled array of the given typecode.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero-width byte typecode or an array
    /// larger than [`MAX_ARRAY_BYTES`].
    pub fn zeros(code: TypeCode, len: usize) -> Result<Self> {
        check_array_size(len, code.width())?;
        Ok(match code {
            TypeCode::Integer => Self::IntegerArray(vec![0; len]),
            TypeCode::Float => Self::FloatArray(vec![0.0; len]),
            TypeCode::ByteArray(width) => Self::ByteArrayArray(ByteRows::zeroed(width, len)?),
            TypeCode::Ed25519Int => {
                Self::Ed25519IntArray(ByteRows::zeroed(ED25519_SCALAR_WIDTH, len)?)
            }
            TypeCode::Ed25519 => Self::Ed25519Array(ByteRows::zeroed(ED25519_POINT_WIDTH, len)?),
        })
    }

    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::IntegerArray(_) => ValueType::Array(TypeCode::Integer),
            Self::FloatArray(_) => ValueType::Array(TypeCode::Float),
            Self::ByteArrayArray(rows) => ValueType::Array(TypeCode::ByteArray(rows.width())),
            Self::Ed25519IntArray(_) => ValueType::Array(TypeCode::Ed25519Int),
            Self::Ed25519Array(_) => ValueType::Array(TypeCode::Ed25519),
            Self::ListMap(map) => ValueType::ListMap(map.codes().to_vec()),
            Self::Pair(..) => ValueType::Pair,
            Self::Node(_) => ValueType::Node,
            Self::Slice(_) => ValueType::Slice,
        }
    }

    /// Returns the array typecode, or `None` for aggregates.
    #[must_use]
    pub fn typecode(&self) -> Option<TypeCode> {
        self.value_type().typecode()
    }

    /// Number of elements, or `None` for a slice (which has no length until resolved).
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::IntegerArray(xs) => Some(xs.len()),
            Self::FloatArray(xs) => Some(xs.len()),
            Self::ByteArrayArray(rows) | Self::Ed25519IntArray(rows) | Self::Ed25519Array(rows) => {
                Some(rows.len())
            }
            Self::ListMap(map) => Some(map.len()),
            Self::Pair(..) => Some(2),
            Self::Node(tree) => Some(tree.len()),
            Self::Slice(_) => None,
        }
    }

    /// Returns true if this value has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Attempts to view this value as an integer array.
    #[must_use]
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::IntegerArray(xs) => Some(xs),
            _ => None,
        }
    }

    /// Attempts to view this value as a float array.
    #[must_use]
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::FloatArray(xs) => Some(xs),
            _ => None,
        }
    }

    /// Attempts to view this value as a `bN` array.
    #[must_use]
    pub const fn as_byte_array(&self) -> Option<&ByteRows> {
        match self {
            Self::ByteArrayArray(rows) => Some(rows),
            _ => None,
        }
    }

    /// Views any byte-oriented array (`bN`, `I`, `E`) as rows.
    #[must_use]
    pub const fn as_rows(&self) -> Option<&ByteRows> {
        match self {
            Self::ByteArrayArray(rows) | Self::Ed25519IntArray(rows) | Self::Ed25519Array(rows) => {
                Some(rows)
            }
            _ => None,
        }
    }

    /// Attempts to extract a list-map.
    #[must_use]
    pub const fn as_listmap(&self) -> Option<&ListMap> {
        match self {
            Self::ListMap(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to extract a node tree.
    #[must_use]
    pub const fn as_node(&self) -> Option<&NodeTree> {
        match self {
            Self::Node(tree) => Some(tree),
            _ => None,
        }
    }

    /// Attempts to extract a slice.
    #[must_use]
    pub const fn as_slice(&self) -> Option<&Slice> {
        match self {
            Self::Slice(slice) => Some(slice),
            _ => None,
        }
    }

    /// Attempts to extract both halves of a pair.
    #[must_use]
    pub fn as_pair(&self) -> Option<(&Value, &Value)> {
        match self {
            Self::Pair(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Integer elements, or a type mismatch.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this is not an `i` array.
    pub fn ints(&self) -> Result<&[i64]> {
        self.as_ints()
            .ok_or_else(|| Error::type_mismatch("i", self.value_type()))
    }

    /// Float elements, or a type mismatch.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this is not an `f` array.
    pub fn floats(&self) -> Result<&[f64]> {
        self.as_floats()
            .ok_or_else(|| Error::type_mismatch("f", self.value_type()))
    }

    /// Rows of a byte-oriented array, or a type mismatch.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this is not a `bN`, `I`, or `E` array.
    pub fn rows(&self) -> Result<&ByteRows> {
        self.as_rows()
            .ok_or_else(|| Error::type_mismatch("byte array", self.value_type()))
    }

    /// Rows of a `bN` array, or a type mismatch.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this is not a `bN` array.
    pub fn byte_array(&self) -> Result<&ByteRows> {
        self.as_byte_array()
            .ok_or_else(|| Error::type_mismatch("bN", self.value_type()))
    }

    /// The only element of a one-element `i` array.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for other types and `InvalidInput` for other lengths.
    pub fn single_int(&self) -> Result<i64> {
        match self.ints()? {
            [x] => Ok(*x),
            xs => Err(Error::invalid_input(format!(
                "expected a single integer, got {} elements",
                xs.len()
            ))),
        }
    }

    /// The only element of a one-element `f` array.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for other types and `InvalidInput` for other lengths.
    pub fn single_float(&self) -> Result<f64> {
        match self.floats()? {
            [x] => Ok(*x),
            xs => Err(Error::invalid_input(format!(
                "expected a single float, got {} elements",
                xs.len()
            ))),
        }
    }

    /// The only row of a one-row byte-oriented array.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for other types and `InvalidInput` for other lengths.
    pub fn single_row(&self) -> Result<&[u8]> {
        let rows = self.rows()?;
        match (rows.len(), rows.row(0)) {
            (1, Some(row)) => Ok(row),
            (n, _) => Err(Error::invalid_input(format!(
                "expected a single byte row, got {n} rows"
            ))),
        }
    }

    /// A non-negative length or count held in a one-element `i` array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the integer is negative.
    pub fn single_len(&self) -> Result<usize> {
        let n = self.single_int()?;
        usize::try_from(n).map_err(|_| Error::invalid_input(format!("negative length {n}")))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::IntegerArray(a), Self::IntegerArray(b)) => a == b,
            // Bitwise comparison keeps NaN payloads equal to themselves.
            (Self::FloatArray(a), Self::FloatArray(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Self::ByteArrayArray(a), Self::ByteArrayArray(b))
            | (Self::Ed25519IntArray(a), Self::Ed25519IntArray(b))
            | (Self::Ed25519Array(a), Self::Ed25519Array(b)) => a == b,
            (Self::ListMap(a), Self::ListMap(b)) => a == b,
            (Self::Pair(a1, a2), Self::Pair(b1, b2)) => a1 == b1 && a2 == b2,
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Slice(a), Self::Slice(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::IntegerArray(xs) => xs.hash(state),
            Self::FloatArray(xs) => {
                for x in xs {
                    x.to_bits().hash(state);
                }
            }
            Self::ByteArrayArray(rows) | Self::Ed25519IntArray(rows) | Self::Ed25519Array(rows) => {
                rows.hash(state);
            }
            Self::ListMap(map) => map.hash(state),
            Self::Pair(a, b) => {
                a.hash(state);
                b.hash(state);
            }
            Self::Node(tree) => tree.hash(state),
            Self::Slice(slice) => slice.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegerArray(xs) => write!(f, "i{xs:?}"),
            Self::FloatArray(xs) => write!(f, "f{xs:?}"),
            Self::ByteArrayArray(rows) => write!(f, "{rows:?}"),
            Self::Ed25519IntArray(rows) => write!(f, "I{:?}", rows.len()),
            Self::Ed25519Array(rows) => write!(f, "E{:?}", rows.len()),
            Self::ListMap(map) => write!(f, "{map:?}"),
            Self::Pair(a, b) => write!(f, "({a:?}, {b:?})"),
            Self::Node(tree) => write!(f, "{tree:?}"),
            Self::Slice(slice) => write!(f, "slice({slice:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Vec<i64>> for Value {
    fn from(xs: Vec<i64>) -> Self {
        Self::IntegerArray(xs)
    }
}

impl From<Vec<f64>> for Value {
    fn from(xs: Vec<f64>) -> Self {
        Self::FloatArray(xs)
    }
}

impl From<ByteRows> for Value {
    fn from(rows: ByteRows) -> Self {
        Self::ByteArrayArray(rows)
    }
}

impl From<ListMap> for Value {
    fn from(map: ListMap) -> Self {
        Self::ListMap(map)
    }
}

impl From<NodeTree> for Value {
    fn from(tree: NodeTree) -> Self {
        Self::Node(tree)
    }
}

impl From<Slice> for Value {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}
