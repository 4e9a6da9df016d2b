//! Integration tests for Layer 1: Store
//!
//! Tests the variable store, snapshots, and the pickle format.

mod pickle;
mod variables;
