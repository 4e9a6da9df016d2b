//! Cross-layer integration tests for segrun
//!
//! Peers wired through the in-process transport, auxiliary store
//! backends, and tracing, all driven by whole segments.

mod auxstore;
mod peers;
mod tracing;
