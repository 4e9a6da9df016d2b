//! Session variable store and pickle format for segrun.
//!
//! This crate provides:
//! - [`VariableStore`] - Name-to-value bindings with O(1) snapshots
//! - [`StoreStats`] - Counters reported by `logstats`
//! - [`pickle`] - The `MessagePack` pickle format for values and whole stores

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod pickle;
pub mod variables;

pub use pickle::{PickleRecord, pickle_value, unpickle_value};
pub use variables::{StoreSnapshot, StoreStats, VariableStore};
