//! ECDSA over secp256k1 with SHA-256 prehashing.
//!
//! Key and signature layouts:
//! - private key: 32-byte big-endian scalar (`b32`)
//! - public key: 33-byte compressed SEC1 point (`b33`)
//! - signature: 64-byte `r || s` (`b64`)

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use segrun_foundation::{ByteRows, Error, Result};

use crate::sha::sha256;
use crate::{check_key_len, crypto_error};

/// Private key size in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Compressed public key size in bytes.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Signature size in bytes.
pub const SIGNATURE_LEN: usize = 64;

fn signing_key(private: &[u8]) -> Result<SigningKey> {
    check_key_len(private, PRIVATE_KEY_LEN)?;
    SigningKey::from_slice(private).map_err(crypto_error)
}

fn verifying_key(public: &[u8]) -> Result<VerifyingKey> {
    check_key_len(public, PUBLIC_KEY_LEN)?;
    VerifyingKey::from_sec1_bytes(public).map_err(crypto_error)
}

/// Generates a private key.
pub fn keygen<R: RngCore + CryptoRng>(rng: &mut R) -> Vec<u8> {
    SigningKey::random(rng).to_bytes().to_vec()
}

/// Derives the compressed public key for a private key.
///
/// # Errors
///
/// Returns `InvalidKeyLength` for a key that is not 32 bytes and
/// `CryptoError` for a scalar outside the curve order.
pub fn public_key(private: &[u8]) -> Result<Vec<u8>> {
    let key = signing_key(private)?;
    Ok(key.verifying_key().to_encoded_point(true).as_bytes().to_vec())
}

/// Signs the SHA-256 digest of each message row.
///
/// # Errors
///
/// Returns a key error from decoding `private`, or `CryptoError` if signing fails.
pub fn sign(private: &[u8], messages: &ByteRows) -> Result<ByteRows> {
    let key = signing_key(private)?;
    let mut out = ByteRows::new(SIGNATURE_LEN)?;
    for message in messages.rows() {
        let signature: Signature = key.sign_prehash(&sha256(message)).map_err(crypto_error)?;
        out.push(&signature.to_bytes())?;
    }
    Ok(out)
}

/// Verifies each message row against the matching signature row.
///
/// A signature that decodes but does not match yields 0; only structurally
/// malformed signatures are errors.
///
/// # Errors
///
/// Returns `MalformedSignature` if the signatures are not `b64` rows or do
/// not decode, and `LengthMismatch` if the row counts differ.
pub fn verify(public: &[u8], messages: &ByteRows, signatures: &ByteRows) -> Result<Vec<i64>> {
    let key = verifying_key(public)?;
    if signatures.width() != SIGNATURE_LEN {
        return Err(Error::malformed_signature(format!(
            "ECDSA signatures are {SIGNATURE_LEN} bytes, got {}",
            signatures.width()
        )));
    }
    if messages.len() != signatures.len() {
        return Err(Error::length_mismatch(messages.len(), signatures.len()));
    }
    messages
        .rows()
        .zip(signatures.rows())
        .map(|(message, raw)| {
            let signature = Signature::from_slice(raw)
                .map_err(|e| Error::malformed_signature(e.to_string()))?;
            Ok(i64::from(
                key.verify_prehash(&sha256(message), &signature).is_ok(),
            ))
        })
        .collect()
}
