//! The transmission envelope.
//!
//! A value sent to a peer travels as a [`Transfer`]: the pickled value plus
//! the name it should be bound to on arrival and where it came from. The
//! envelope is `MessagePack`, like the pickle records it wraps.

use serde::{Deserialize, Serialize};

use segrun_foundation::{Error, Result, Value};
use segrun_store::PickleRecord;

/// A pickled value addressed to a variable on another peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Label of the sending session, if it set one. The receiver delivers
    /// into its session of the same label.
    pub session: Option<String>,
    /// Node id of the sender.
    pub from: String,
    /// Variable name to bind on the receiving side.
    pub name: String,
    /// The value.
    pub record: PickleRecord,
}

impl Transfer {
    /// Wraps a value.
    ///
    /// # Errors
    ///
    /// Propagates pickling failures.
    pub fn new(
        session: Option<String>,
        from: impl Into<String>,
        name: impl Into<String>,
        value: &Value,
    ) -> Result<Self> {
        Ok(Self {
            session,
            from: from.into(),
            name: name.into(),
            record: PickleRecord::from_value(value)?,
        })
    }

    /// Encodes the envelope.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Decodes an envelope.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` for malformed bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Unpickles the carried value.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the record is inconsistent.
    pub fn into_value(self) -> Result<Value> {
        self.record.into_value()
    }
}
