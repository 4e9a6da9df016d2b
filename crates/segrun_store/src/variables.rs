//! Name-to-value bindings with immutable snapshots.
//!
//! The store sits on a persistent ordered map, so cloning it shares
//! structure instead of copying values. The executor relies on this to
//! take a snapshot before every command and roll back on failure.

use std::fmt;

use im::OrdMap;
use segrun_foundation::{Error, Result, Value};

/// Variable bindings for one session.
#[derive(Clone, Default, PartialEq)]
pub struct VariableStore {
    vars: OrdMap<String, Value>,
}

/// A frozen copy of a [`VariableStore`], restorable in O(1).
#[derive(Clone)]
pub struct StoreSnapshot(OrdMap<String, Value>);

/// Summary counters for a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of bound names.
    pub variables: usize,
    /// Total elements across all sized values.
    pub elements: usize,
    /// Approximate payload size in bytes.
    pub bytes: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} elements, ~{} bytes",
            self.variables, self.elements, self.bytes
        )
    }
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a binding.
    ///
    /// # Errors
    ///
    /// Returns `VariableNotFound` if `name` is unbound.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.vars
            .get(name)
            .ok_or_else(|| Error::variable_not_found(name))
    }

    /// Binds `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Removes a binding, returning its value.
    ///
    /// # Errors
    ///
    /// Returns `VariableNotFound` if `name` is unbound.
    pub fn delete(&mut self, name: &str) -> Result<Value> {
        self.vars
            .remove(name)
            .ok_or_else(|| Error::variable_not_found(name))
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.vars.clear();
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Counts variables, elements and approximate bytes.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.vars.values().fold(
            StoreStats {
                variables: self.vars.len(),
                ..StoreStats::default()
            },
            |mut acc, value| {
                acc.elements += value.len().unwrap_or(0);
                acc.bytes += estimated_size(value);
                acc
            },
        )
    }

    /// Takes an O(1) snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot(self.vars.clone())
    }

    /// Replaces the current bindings with a snapshot.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.vars = snapshot.0;
    }
}

impl fmt::Debug for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.vars.iter()).finish()
    }
}

impl FromIterator<(String, Value)> for VariableStore {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Rough in-memory payload size of a value.
fn estimated_size(value: &Value) -> usize {
    match value {
        Value::IntegerArray(xs) => xs.len() * 8,
        Value::FloatArray(xs) => xs.len() * 8,
        Value::ByteArrayArray(rows) | Value::Ed25519IntArray(rows) | Value::Ed25519Array(rows) => {
            rows.as_bytes().len()
        }
        Value::ListMap(map) => map.len() * map.codes().iter().map(|c| c.width()).sum::<usize>(),
        Value::Pair(a, b) => estimated_size(a) + estimated_size(b),
        Value::Node(tree) => tree
            .nodes()
            .iter()
            .map(|n| n.label.len() + n.payload.as_ref().map_or(0, estimated_size))
            .sum(),
        Value::Slice(_) => 24,
    }
}
