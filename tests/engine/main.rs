//! Integration tests for Layer 2: Engine
//!
//! Tests segment execution, the failure policy, mux dispatch, and the
//! command set as driven through whole segments.

mod commands;
mod failures;
mod scenarios;
