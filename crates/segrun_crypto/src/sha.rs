//! Row digests.

use segrun_foundation::{ByteRows, Result};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

/// Digest size of both hash functions, in bytes.
pub const DIGEST_LEN: usize = 32;

fn digest_rows<D: Digest>(rows: &ByteRows) -> Result<ByteRows> {
    ByteRows::from_rows(DIGEST_LEN, rows.rows().map(D::digest))
}

/// SHA3-256 of each row, as `b32` rows.
///
/// # Errors
///
/// Infallible in practice; the `Result` comes from building the output rows.
pub fn sha3_256_rows(rows: &ByteRows) -> Result<ByteRows> {
    digest_rows::<Sha3_256>(rows)
}

/// SHA-256 of each row, as `b32` rows.
///
/// # Errors
///
/// Infallible in practice; the `Result` comes from building the output rows.
pub fn sha256_rows(rows: &ByteRows) -> Result<ByteRows> {
    digest_rows::<Sha256>(rows)
}

/// SHA-256 of a single message.
#[must_use]
pub fn sha256(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(bytes).into()
}
