//! Cipher, hash, and signature primitives for segrun.
//!
//! Every primitive works on [`ByteRows`](segrun_foundation::ByteRows):
//! rows are processed independently unless a function says otherwise, and
//! key material is passed as raw bytes in the fixed layouts documented on
//! each module.
//!
//! This crate provides:
//! - [`aes`] - AES-256 block (ECB) and counter-mode encryption
//! - [`grain`] - Grain-128AEADv2 keystream generation
//! - [`sha`] - SHA3-256 and SHA-256 row digests
//! - [`ecdsa`] - secp256k1 ECDSA over SHA-256 prehashes
//! - [`rsa`] - RSA PKCS#1 v1.5 encryption and signatures

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aes;
pub mod ecdsa;
pub mod grain;
pub mod rsa;
pub mod sha;

use segrun_foundation::Error;

/// Wraps a library error as a `CryptoError`.
pub(crate) fn crypto_error(e: impl std::fmt::Display) -> Error {
    Error::crypto(e.to_string())
}

/// Fails with `InvalidKeyLength` unless `key` is `expected` bytes long.
pub(crate) fn check_key_len(key: &[u8], expected: usize) -> segrun_foundation::Result<()> {
    if key.len() == expected {
        Ok(())
    } else {
        Err(Error::invalid_key_length(expected, key.len()))
    }
}
