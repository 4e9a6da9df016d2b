//! Peer hosting, in-process transport, auxiliary stores, and tracing for
//! segrun.
//!
//! This crate provides:
//! - [`Peer`] - Many labelled sessions on one node, with inbound delivery
//! - [`MemoryTransport`] - Routes transfers between peers in one process
//! - [`MemoryAuxStore`], [`FileAuxStore`] - Auxiliary store backends
//! - [`trace`] - A ring-buffer [`LogSink`](segrun_engine::LogSink) with
//!   formatters

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auxstore;
pub mod peer;
pub mod trace;
pub mod transport;

pub use auxstore::{FileAuxStore, MemoryAuxStore};
pub use peer::{DEFAULT_SESSION, Peer, PeerConfig, PeerError};
pub use trace::{Tracer, TracerConfig};
pub use transport::MemoryTransport;
