//! The pickle format: `MessagePack` records carrying a typecode and payload.
//!
//! A pickled value is a [`PickleRecord`] encoded with named fields. The
//! `typecode` field repeats the value's type as text (`i`, `b16`,
//! `listmap<ib4>`, `pair`, ...) and must agree with the payload on the way
//! back in, so a corrupted or hand-built record cannot produce a value whose
//! representation disagrees with its typecode.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use segrun_foundation::{
    ByteRows, Error, ErrorKind, ListMap, Node, NodeTree, Result, Slice, TypeCode, Value,
};

use crate::variables::VariableStore;

/// A self-describing encoded value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickleRecord {
    /// Textual type of the payload.
    pub typecode: String,
    /// The encoded contents.
    pub payload: Payload,
}

/// Encoded contents of a [`PickleRecord`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// `i` elements.
    Integers(Vec<i64>),
    /// `f` elements.
    Floats(Vec<f64>),
    /// Rows of a `bN`, `I` or `E` array, flattened.
    Rows {
        /// Row width in bytes.
        width: usize,
        /// Concatenated rows.
        data: Vec<u8>,
    },
    /// List-map key layout and key columns.
    ListMap {
        /// Key column typecodes.
        codes: Vec<TypeCode>,
        /// One record per key column.
        columns: Vec<PickleRecord>,
    },
    /// Both halves of a pair.
    Pair(Box<PickleRecord>, Box<PickleRecord>),
    /// Node arena, root first.
    Node(Vec<PickledNode>),
    /// Slice bounds.
    Slice(Slice),
}

/// Encoded tree node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickledNode {
    /// Node label.
    pub label: String,
    /// Encoded payload, if any.
    pub payload: Option<PickleRecord>,
    /// Child indices within the arena.
    pub children: Vec<usize>,
}

/// A whole variable store, bindings in name order.
#[derive(Debug, Serialize, Deserialize)]
struct StoreImage {
    variables: Vec<(String, PickleRecord)>,
}

impl PickleRecord {
    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Propagates failures from reading list-map key columns.
    pub fn from_value(value: &Value) -> Result<Self> {
        let payload = match value {
            Value::IntegerArray(xs) => Payload::Integers(xs.clone()),
            Value::FloatArray(xs) => Payload::Floats(xs.clone()),
            Value::ByteArrayArray(rows) | Value::Ed25519IntArray(rows) | Value::Ed25519Array(rows) => {
                Payload::Rows {
                    width: rows.width(),
                    data: rows.as_bytes().to_vec(),
                }
            }
            Value::ListMap(map) => Payload::ListMap {
                codes: map.codes().to_vec(),
                columns: map
                    .key_columns()?
                    .iter()
                    .map(Self::from_value)
                    .collect::<Result<_>>()?,
            },
            Value::Pair(a, b) => Payload::Pair(
                Box::new(Self::from_value(a)?),
                Box::new(Self::from_value(b)?),
            ),
            Value::Node(tree) => Payload::Node(
                tree.nodes()
                    .iter()
                    .map(|node| {
                        Ok(PickledNode {
                            label: node.label.clone(),
                            payload: node.payload.as_ref().map(Self::from_value).transpose()?,
                            children: node.children.clone(),
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
            Value::Slice(slice) => Payload::Slice(*slice),
        };
        Ok(Self {
            typecode: value.value_type().to_string(),
            payload,
        })
    }

    /// Decodes the record, checking the payload against the typecode.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the typecode disagrees with the
    /// payload, or any validation error from rebuilding the value.
    pub fn into_value(self) -> Result<Value> {
        let value = match self.payload {
            Payload::Integers(xs) => Value::IntegerArray(xs),
            Payload::Floats(xs) => Value::FloatArray(xs),
            Payload::Rows { width, data } => {
                let rows = ByteRows::from_flat(width, data)?;
                match self.typecode.parse::<TypeCode>()? {
                    TypeCode::Ed25519Int => Value::ed25519_ints(rows)?,
                    TypeCode::Ed25519 => Value::ed25519_points(rows)?,
                    _ => Value::ByteArrayArray(rows),
                }
            }
            Payload::ListMap { codes, columns } => {
                let columns = columns
                    .into_iter()
                    .map(Self::into_value)
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<&Value> = columns.iter().collect();
                Value::ListMap(ListMap::from_columns(codes, &refs)?)
            }
            Payload::Pair(a, b) => Value::pair(a.into_value()?, b.into_value()?),
            Payload::Node(nodes) => Value::Node(NodeTree::from_nodes(
                nodes
                    .into_iter()
                    .map(|node| {
                        Ok(Node {
                            label: node.label,
                            payload: node.payload.map(Self::into_value).transpose()?,
                            children: node.children,
                        })
                    })
                    .collect::<Result<_>>()?,
            )?),
            Payload::Slice(slice) => Value::Slice(slice),
        };
        let actual = value.value_type().to_string();
        if actual != self.typecode {
            return Err(Error::serialization(format!(
                "record typecode {} disagrees with its {actual} payload",
                self.typecode
            )));
        }
        Ok(value)
    }
}

fn encode<T: Serialize>(item: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(item).map_err(|e| Error::serialization(e.to_string()))
}

fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::serialization(e.to_string()))
}

/// Pickles a value to bytes.
///
/// # Errors
///
/// Returns `SerializationError` if encoding fails.
pub fn pickle_value(value: &Value) -> Result<Vec<u8>> {
    encode(&PickleRecord::from_value(value)?)
}

/// Restores a value from pickled bytes.
///
/// # Errors
///
/// Returns `SerializationError` for malformed bytes or a record whose
/// typecode disagrees with its payload.
pub fn unpickle_value(bytes: &[u8]) -> Result<Value> {
    decode::<PickleRecord>(bytes)?.into_value()
}

/// Pickles every binding in a store.
///
/// # Errors
///
/// Returns `SerializationError` if encoding fails.
pub fn pickle_store(store: &VariableStore) -> Result<Vec<u8>> {
    let variables = store
        .iter()
        .map(|(name, value)| Ok((name.clone(), PickleRecord::from_value(value)?)))
        .collect::<Result<_>>()?;
    encode(&StoreImage { variables })
}

/// Restores a store from pickled bytes.
///
/// # Errors
///
/// Returns `SerializationError` for malformed bytes or invalid records.
pub fn unpickle_store(bytes: &[u8]) -> Result<VariableStore> {
    decode::<StoreImage>(bytes)?
        .variables
        .into_iter()
        .map(|(name, record)| Ok((name, record.into_value()?)))
        .collect()
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!(
        "failed to {action} file '{}': {e}",
        path.display()
    )))
}

/// Saves a pickled store to a file, creating or overwriting it.
///
/// # Errors
///
/// Returns `IoError` if the file cannot be written, or
/// `SerializationError` if encoding fails.
pub fn save_to_file<P: AsRef<Path>>(store: &VariableStore, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = pickle_store(store)?;
    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))
}

/// Loads a pickled store from a file.
///
/// # Errors
///
/// Returns `IoError` if the file cannot be read, or `SerializationError`
/// if its contents do not decode.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<VariableStore> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read", path, &e))?;
    unpickle_store(&bytes)
}
