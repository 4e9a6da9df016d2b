//! Collaborator traits the engine calls out to.
//!
//! The executor never talks to the network, a database, or a log directly.
//! It holds trait objects for:
//! - [`PeerTransport`]: delivers pickled payloads to other peers
//! - [`AuxStore`]: the auxiliary key-value store behind `auxdb_*`, `save`
//!   and `load`
//! - [`LogSink`]: receives structured [`LogEvent`]s
//!
//! Each trait has a `Null*` implementation used when nothing is wired in.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use segrun_foundation::{Error as EngineError, Value};
use segrun_store::StoreStats;

// =============================================================================
// Peer Transport
// =============================================================================

/// Where a payload is going.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    /// Peer node id.
    pub peer: String,
    /// Network address recorded by `netinit`, if any.
    pub address: Option<String>,
}

impl Destination {
    /// Creates a destination with no recorded address.
    #[must_use]
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            address: None,
        }
    }

    /// Sets the network address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}@{address}", self.peer),
            None => write!(f, "{}", self.peer),
        }
    }
}

/// Failure reported by a transport.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer is not known or not listening.
    #[error("peer unreachable: {0}")]
    Unreachable(String),
    /// The send did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Anything else the transport reports.
    #[error("{0}")]
    Other(String),
}

/// Delivers serialized payloads to peers.
///
/// Implementations may block. The executor applies its own timeout around
/// every call, so a hung peer costs the issuing session one timeout and no
/// more.
pub trait PeerTransport: Send + Sync {
    /// Sends a payload to one peer.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if delivery fails.
    fn send(&self, to: &Destination, payload: &[u8]) -> Result<(), TransportError>;

    /// Sends a payload to several peers, reporting each outcome separately.
    fn broadcast(&self, to: &[Destination], payload: &[u8]) -> Vec<Result<(), TransportError>> {
        to.iter().map(|dest| self.send(dest, payload)).collect()
    }
}

/// A transport with no peers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransport;

impl PeerTransport for NullTransport {
    fn send(&self, to: &Destination, _payload: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Unreachable(to.peer.clone()))
    }
}

// =============================================================================
// Auxiliary Store
// =============================================================================

/// Failure reported by an auxiliary store.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AuxError(pub String);

/// External key-value storage.
///
/// Reads and writes pass straight through. The engine adds no caching and
/// no transactional guarantee beyond what the implementation provides.
pub trait AuxStore: Send + Sync {
    /// Reads a key. `Ok(None)` means the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an [`AuxError`] if the store itself fails.
    fn get(&self, key: &str) -> Result<Option<Value>, AuxError>;

    /// Writes a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an [`AuxError`] if the store itself fails.
    fn put(&self, key: &str, value: Value) -> Result<(), AuxError>;
}

/// An auxiliary store that holds nothing and refuses writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAuxStore;

impl AuxStore for NullAuxStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, AuxError> {
        Ok(None)
    }

    fn put(&self, _key: &str, _value: Value) -> Result<(), AuxError> {
        Err(AuxError("no auxiliary store configured".to_string()))
    }
}

// =============================================================================
// Log Sink
// =============================================================================

/// A structured event emitted during execution.
#[derive(Clone, Debug, PartialEq)]
pub enum LogEvent {
    /// A segment is about to run.
    SegmentStart {
        /// Session label, if set.
        session: Option<String>,
        /// Segment identifier, if set.
        segment: Option<String>,
        /// Number of steps.
        steps: usize,
    },
    /// A step is about to run.
    CommandStart {
        /// Step position.
        position: usize,
        /// Opcode.
        opcode: String,
    },
    /// A step completed.
    CommandEnd {
        /// Step position.
        position: usize,
        /// Opcode.
        opcode: String,
    },
    /// A step failed; the segment stops here.
    CommandFailed {
        /// Step position.
        position: usize,
        /// Opcode.
        opcode: String,
        /// The failure.
        error: EngineError,
    },
    /// A segment finished, successfully or not.
    SegmentEnd {
        /// Steps that completed.
        completed: usize,
        /// Whether a step failed.
        failed: bool,
    },
    /// Free text from `logmessage`.
    Message(String),
    /// A variable dump from `logvariable`.
    Variable {
        /// Variable name.
        name: String,
        /// The value, if bound.
        value: Option<Value>,
    },
    /// Store counters from `logstats`.
    Stats(StoreStats),
}

impl LogEvent {
    /// Short event name, used for filtering.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SegmentStart { .. } => "segment_start",
            Self::CommandStart { .. } => "command_start",
            Self::CommandEnd { .. } => "command_end",
            Self::CommandFailed { .. } => "command_failed",
            Self::SegmentEnd { .. } => "segment_end",
            Self::Message(_) => "message",
            Self::Variable { .. } => "variable",
            Self::Stats(_) => "stats",
        }
    }
}

/// Failure reported by a log sink. Always swallowed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Receives log events. Never observed by control flow.
pub trait LogSink: Send + Sync {
    /// Records one event.
    ///
    /// # Errors
    ///
    /// May return a [`SinkError`]; callers ignore it.
    fn record(&self, event: &LogEvent) -> Result<(), SinkError>;
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _event: &LogEvent) -> Result<(), SinkError> {
        Ok(())
    }
}
