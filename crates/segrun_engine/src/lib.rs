//! Command registry, command set, sessions, and segment executor for segrun.
//!
//! This crate provides:
//! - [`Segment`] - An ordered program of [`Step`]s
//! - [`CommandRegistry`] - The immutable opcode table
//! - [`commands`] - The standard command set
//! - [`Session`] - Per-session store, RNG, identity and peers, plus its [`Inbox`]
//! - [`Executor`] - Runs segments with fail-fast, prefix-preserving semantics
//! - [`PeerTransport`], [`AuxStore`], [`LogSink`] - External collaborators

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod commands;
pub mod config;
pub mod context;
pub mod executor;
pub mod operand;
pub mod registry;
pub mod segment;
pub mod session;
pub mod transfer;

pub use commands::CommandContext;
pub use config::EngineConfig;
pub use context::{
    AuxError, AuxStore, Destination, LogEvent, LogSink, NullAuxStore, NullSink, NullTransport,
    PeerTransport, SinkError, TransportError,
};
pub use executor::{Executor, Failure, MAX_PENDING_TRANSPORT_CALLS, Outcome, Transmission};
pub use operand::Operand;
pub use registry::{CommandFn, CommandRegistry, CommandSpec, Outputs, RegistryBuilder, Response};
pub use segment::{Invocation, MUX_OPCODE, Segment, Step};
pub use session::{Inbox, Session};
pub use transfer::Transfer;
