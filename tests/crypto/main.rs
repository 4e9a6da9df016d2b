//! Integration tests for Layer 1: Crypto
//!
//! Tests ciphers, digests, and signatures against known answers and tampering.

mod ciphers;
mod signatures;
