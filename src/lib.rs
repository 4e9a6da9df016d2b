//! Segrun - Segment execution engine
//!
//! This crate re-exports all layers of the segrun system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: segrun_runtime    Peers, in-process transport, aux stores, tracing
//! Layer 2: segrun_engine     Registry, command set, sessions, executor
//! Layer 1: segrun_store      Variable store, pickle format
//!          segrun_crypto     AES, Grain, SHA, ECDSA, RSA primitives
//! Layer 0: segrun_foundation Typecodes, Value, ListMap, NodeTree, Error
//! ```

pub use segrun_crypto as crypto;
pub use segrun_engine as engine;
pub use segrun_foundation as foundation;
pub use segrun_runtime as runtime;
pub use segrun_store as store;
