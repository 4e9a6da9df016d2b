//! Insertion-ordered maps from composite keys to positions.
//!
//! A list-map's keys are tuples drawn row-wise from parallel "key column"
//! arrays (one column per typecode in the map's layout). Each key maps to
//! its insertion position. Keys are unique.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Result;
use crate::error::{Error, ErrorKind};
use crate::rows::ByteRows;
use crate::typecode::TypeCode;
use crate::value::Value;

/// Insertion-ordered composite-key map.
#[derive(Clone, Default)]
pub struct ListMap {
    codes: Vec<TypeCode>,
    /// Encoded keys in insertion order; a key's index is its position.
    keys: Vec<Vec<u8>>,
    positions: HashMap<Vec<u8>, usize>,
}

/// Position bookkeeping returned by [`ListMap::remove`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    /// Former positions of the removed keys.
    pub removed: Vec<i64>,
    /// Former positions of surviving keys whose position changed.
    pub moved_from: Vec<i64>,
    /// New positions of those surviving keys, parallel to `moved_from`.
    pub moved_to: Vec<i64>,
}

#[allow(clippy::cast_possible_wrap)]
fn as_position(i: usize) -> i64 {
    i as i64
}

fn hex(key: &[u8]) -> String {
    key.iter().map(|b| format!("{b:02x}")).collect()
}

impl ListMap {
    /// Creates an empty list-map with the given key layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the layout is empty or contains `E`.
    pub fn new(codes: Vec<TypeCode>) -> Result<Self> {
        if codes.is_empty() {
            return Err(Error::invalid_input("list-map needs at least one key column"));
        }
        if codes.contains(&TypeCode::Ed25519) {
            return Err(Error::invalid_input("Ed25519 points cannot be list-map keys"));
        }
        Ok(Self {
            codes,
            keys: Vec::new(),
            positions: HashMap::new(),
        })
    }

    /// Builds a list-map from key columns, assigning positions in row order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if any key repeats, or a type/length error if
    /// the columns do not match the layout.
    pub fn from_columns(codes: Vec<TypeCode>, columns: &[&Value]) -> Result<Self> {
        let mut map = Self::new(codes)?;
        map.insert(columns, false)?;
        Ok(map)
    }

    /// The key column typecodes.
    #[must_use]
    pub fn codes(&self) -> &[TypeCode] {
        &self.codes
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validates key columns against the layout, returning the row count.
    fn check_columns(&self, columns: &[&Value]) -> Result<usize> {
        if columns.len() != self.codes.len() {
            return Err(Error::length_mismatch(self.codes.len(), columns.len()));
        }
        let mut rows = None;
        for (code, column) in self.codes.iter().zip(columns) {
            if column.typecode() != Some(*code) {
                return Err(Error::type_mismatch(code.to_string(), column.value_type()));
            }
            let len = column.len().unwrap_or(0);
            match rows {
                None => rows = Some(len),
                Some(n) if n != len => return Err(Error::length_mismatch(n, len)),
                Some(_) => {}
            }
        }
        Ok(rows.unwrap_or(0))
    }

    /// Encodes row `row` of the key columns into a single byte key.
    fn encode(columns: &[&Value], row: usize) -> Vec<u8> {
        let mut key = Vec::new();
        for column in columns {
            match column {
                Value::IntegerArray(xs) => key.extend_from_slice(&xs[row].to_le_bytes()),
                Value::FloatArray(xs) => key.extend_from_slice(&xs[row].to_bits().to_le_bytes()),
                Value::ByteArrayArray(rows) | Value::Ed25519IntArray(rows) => {
                    key.extend_from_slice(rows.row(row).unwrap_or_default());
                }
                // Rejected by check_columns.
                Value::Ed25519Array(_)
                | Value::ListMap(_)
                | Value::Pair(..)
                | Value::Node(_)
                | Value::Slice(_) => {}
            }
        }
        key
    }

    fn encode_all(&self, columns: &[&Value]) -> Result<Vec<Vec<u8>>> {
        let rows = self.check_columns(columns)?;
        Ok((0..rows).map(|row| Self::encode(columns, row)).collect())
    }

    /// Decodes a set of keys back into key columns.
    fn decode(&self, keys: &[&[u8]]) -> Result<Vec<Value>> {
        let mut columns = Vec::with_capacity(self.codes.len());
        let mut offset = 0;
        for code in &self.codes {
            let width = code.width();
            let parts = keys.iter().map(|key| &key[offset..offset + width]);
            let column = match code {
                TypeCode::Integer => Value::IntegerArray(
                    parts
                        .map(|p| i64::from_le_bytes(p.try_into().unwrap_or([0; 8])))
                        .collect(),
                ),
                TypeCode::Float => Value::FloatArray(
                    parts
                        .map(|p| f64::from_bits(u64::from_le_bytes(p.try_into().unwrap_or([0; 8]))))
                        .collect(),
                ),
                TypeCode::ByteArray(_) => Value::ByteArrayArray(ByteRows::from_rows(width, parts)?),
                TypeCode::Ed25519Int => Value::Ed25519IntArray(ByteRows::from_rows(width, parts)?),
                TypeCode::Ed25519 => {
                    return Err(Error::new(ErrorKind::Internal(
                        "Ed25519 key column in list-map".to_string(),
                    )));
                }
            };
            columns.push(column);
            offset += width;
        }
        Ok(columns)
    }

    /// All keys as columns, in insertion order.
    ///
    /// # Errors
    ///
    /// Only fails if the map's internal layout is corrupt.
    pub fn key_columns(&self) -> Result<Vec<Value>> {
        let keys: Vec<&[u8]> = self.keys.iter().map(Vec::as_slice).collect();
        self.decode(&keys)
    }

    /// Positions of the given keys, substituting `default` for misses.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` on a miss when no default is supplied.
    pub fn lookup(&self, columns: &[&Value], default: Option<i64>) -> Result<Vec<i64>> {
        self.encode_all(columns)?
            .iter()
            .map(|key| match (self.positions.get(key), default) {
                (Some(&pos), _) => Ok(as_position(pos)),
                (None, Some(d)) => Ok(d),
                (None, None) => Err(Error::new(ErrorKind::KeyNotFound(hex(key)))),
            })
            .collect()
    }

    /// 1 for each key present, 0 otherwise.
    ///
    /// # Errors
    ///
    /// Returns a type or length error if the columns do not match the layout.
    pub fn contains(&self, columns: &[&Value]) -> Result<Vec<i64>> {
        Ok(self
            .encode_all(columns)?
            .iter()
            .map(|key| i64::from(self.positions.contains_key(key)))
            .collect())
    }

    /// Appends new keys.
    ///
    /// Returns the key columns actually added and their positions. With
    /// `ignore_duplicates`, keys already present (or repeated in the input)
    /// are skipped; otherwise they fail the whole insertion and the map is
    /// left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` as described above.
    pub fn insert(
        &mut self,
        columns: &[&Value],
        ignore_duplicates: bool,
    ) -> Result<(Vec<Value>, Vec<i64>)> {
        let mut fresh: Vec<Vec<u8>> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for key in self.encode_all(columns)? {
            if self.positions.contains_key(&key) || !seen.insert(key.clone()) {
                if ignore_duplicates {
                    continue;
                }
                return Err(Error::new(ErrorKind::DuplicateKey(hex(&key))));
            }
            fresh.push(key);
        }

        let mut positions = Vec::with_capacity(fresh.len());
        for key in &fresh {
            let pos = self.keys.len();
            self.positions.insert(key.clone(), pos);
            self.keys.push(key.clone());
            positions.push(as_position(pos));
        }

        let added: Vec<&[u8]> = fresh.iter().map(Vec::as_slice).collect();
        Ok((self.decode(&added)?, positions))
    }

    /// Removes keys, compacting the remaining positions in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` for an absent key unless `ignore_missing` is set,
    /// in which case the map is left unchanged.
    pub fn remove(&mut self, columns: &[&Value], ignore_missing: bool) -> Result<Removal> {
        let mut doomed = std::collections::BTreeSet::new();
        for key in self.encode_all(columns)? {
            match self.positions.get(&key) {
                Some(&pos) => {
                    doomed.insert(pos);
                }
                None if ignore_missing => {}
                None => return Err(Error::new(ErrorKind::KeyNotFound(hex(&key)))),
            }
        }

        let mut removal = Removal {
            removed: doomed.iter().map(|&p| as_position(p)).collect(),
            ..Removal::default()
        };
        let old = std::mem::take(&mut self.keys);
        self.positions.clear();
        for (pos, key) in old.into_iter().enumerate() {
            if doomed.contains(&pos) {
                continue;
            }
            let new_pos = self.keys.len();
            if new_pos != pos {
                removal.moved_from.push(as_position(pos));
                removal.moved_to.push(as_position(new_pos));
            }
            self.positions.insert(key.clone(), new_pos);
            self.keys.push(key);
        }
        Ok(removal)
    }

    /// A new list-map holding the keys of `self` that also appear in `columns`,
    /// in `self`'s order.
    ///
    /// # Errors
    ///
    /// Returns a type or length error if the columns do not match the layout.
    pub fn intersect(&self, columns: &[&Value]) -> Result<Self> {
        let other: std::collections::HashSet<Vec<u8>> =
            self.encode_all(columns)?.into_iter().collect();
        let mut out = Self::new(self.codes.clone())?;
        for key in self.keys.iter().filter(|k| other.contains(*k)) {
            out.positions.insert(key.clone(), out.keys.len());
            out.keys.push(key.clone());
        }
        Ok(out)
    }

    /// Checks whether the rows of the given key columns are pairwise distinct.
    ///
    /// # Errors
    ///
    /// Returns a type or length error if the columns do not match the layout.
    pub fn rows_unique(&self, columns: &[&Value]) -> Result<bool> {
        let keys = self.encode_all(columns)?;
        let mut seen = std::collections::HashSet::with_capacity(keys.len());
        Ok(keys.into_iter().all(|k| seen.insert(k)))
    }
}

impl PartialEq for ListMap {
    fn eq(&self, other: &Self) -> bool {
        self.codes == other.codes && self.keys == other.keys
    }
}

impl Eq for ListMap {}

impl Hash for ListMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.codes.hash(state);
        self.keys.hash(state);
    }
}

impl fmt::Debug for ListMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listmap<")?;
        for code in &self.codes {
            write!(f, "{code}")?;
        }
        write!(f, ">[{}]", self.keys.len())
    }
}
