//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: TypeCode, Value, array operations, ListMap, NodeTree, and Error.

mod arrays;
mod errors;
mod listmaps;
mod values;
