//! RSA with PKCS#1 v1.5 padding for encryption and SHA-256 signatures.
//!
//! Keys travel as single byte rows. With `s` the modulus size in bytes and
//! every integer big-endian:
//!
//! ```text
//! private: [s: u64][n: s][e: u64][d: s][primes: u64 = 2][p: s][q: s]   width 24 + 4s
//! public:  [s: u64][n: s][e: u64]                                     width 16 + s
//! ```

use rand::{CryptoRng, RngCore};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use segrun_foundation::{ByteRows, Error, Result};
use sha2::Sha256;

use crate::crypto_error;
use crate::sha::sha256;

/// Key size used when none is configured.
pub const DEFAULT_BITS: usize = 3072;

/// PKCS#1 v1.5 encryption padding overhead in bytes.
const PADDING_OVERHEAD: usize = 11;

/// Width of an encoded private key for a modulus of `size` bytes.
#[must_use]
pub const fn private_key_width(size: usize) -> usize {
    24 + 4 * size
}

/// Width of an encoded public key for a modulus of `size` bytes.
#[must_use]
pub const fn public_key_width(size: usize) -> usize {
    16 + size
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(Error::invalid_input("truncated RSA key"));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn big(&mut self, size: usize) -> Result<BigUint> {
        Ok(BigUint::from_bytes_be(self.take(size)?))
    }
}

fn put_big(out: &mut Vec<u8>, value: &BigUint, size: usize) -> Result<()> {
    let bytes = value.to_bytes_be();
    if bytes.len() > size {
        return Err(Error::internal("RSA component wider than its modulus"));
    }
    out.resize(out.len() + size - bytes.len(), 0);
    out.extend_from_slice(&bytes);
    Ok(())
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn exponent(key: &impl PublicKeyParts) -> Result<u64> {
    let bytes = key.e().to_bytes_be();
    if bytes.len() > 8 {
        return Err(Error::crypto("public exponent does not fit in 64 bits"));
    }
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn read_size(reader: &mut Reader<'_>, width: usize, expected: fn(usize) -> usize) -> Result<usize> {
    let size = usize::try_from(reader.u64()?).map_err(|_| Error::invalid_input("RSA size too large"))?;
    if size == 0 || expected(size) != width {
        return Err(Error::invalid_key_length(expected(size), width));
    }
    Ok(size)
}

fn encode_private(key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let size = key.size();
    let [p, q] = key.primes() else {
        return Err(Error::crypto("expected a two-prime key"));
    };
    let mut out = Vec::with_capacity(private_key_width(size));
    put_u64(&mut out, size as u64);
    put_big(&mut out, key.n(), size)?;
    put_u64(&mut out, exponent(key)?);
    put_big(&mut out, key.d(), size)?;
    put_u64(&mut out, 2);
    put_big(&mut out, p, size)?;
    put_big(&mut out, q, size)?;
    Ok(out)
}

fn decode_private(bytes: &[u8]) -> Result<RsaPrivateKey> {
    let mut reader = Reader { bytes };
    let size = read_size(&mut reader, bytes.len(), private_key_width)?;
    let n = reader.big(size)?;
    let e = BigUint::from(reader.u64()?);
    let d = reader.big(size)?;
    if reader.u64()? != 2 {
        return Err(Error::invalid_input("RSA keys must have two primes"));
    }
    let primes = vec![reader.big(size)?, reader.big(size)?];
    RsaPrivateKey::from_components(n, e, d, primes).map_err(crypto_error)
}

fn encode_public(key: &RsaPublicKey) -> Result<Vec<u8>> {
    let size = key.size();
    let mut out = Vec::with_capacity(public_key_width(size));
    put_u64(&mut out, size as u64);
    put_big(&mut out, key.n(), size)?;
    put_u64(&mut out, exponent(key)?);
    Ok(out)
}

fn decode_public(bytes: &[u8]) -> Result<RsaPublicKey> {
    let mut reader = Reader { bytes };
    let size = read_size(&mut reader, bytes.len(), public_key_width)?;
    let n = reader.big(size)?;
    let e = BigUint::from(reader.u64()?);
    RsaPublicKey::new(n, e).map_err(crypto_error)
}

/// Generates a private key of `bits` bits in the encoded layout.
///
/// # Errors
///
/// Returns `CryptoError` if key generation fails.
pub fn keygen<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::new(rng, bits).map_err(crypto_error)?;
    encode_private(&key)
}

/// Extracts the encoded public key from an encoded private key.
///
/// # Errors
///
/// Returns `InvalidKeyLength` or `CryptoError` for a malformed private key.
pub fn public_key(private: &[u8]) -> Result<Vec<u8>> {
    encode_public(&decode_private(private)?.to_public_key())
}

/// Encrypts each row separately; output rows are the modulus size.
///
/// # Errors
///
/// Returns `InvalidInput` if rows are too long for the key, or a key error.
pub fn encrypt<R: RngCore + CryptoRng>(
    rng: &mut R,
    public: &[u8],
    data: &ByteRows,
) -> Result<ByteRows> {
    let key = decode_public(public)?;
    let size = key.size();
    if data.width() + PADDING_OVERHEAD > size {
        return Err(Error::invalid_input(format!(
            "b{} rows are too long for a {size}-byte RSA key",
            data.width()
        )));
    }
    let mut out = ByteRows::new(size)?;
    for row in data.rows() {
        out.push(&key.encrypt(rng, Pkcs1v15Encrypt, row).map_err(crypto_error)?)?;
    }
    Ok(out)
}

/// Decrypts each row. The plaintext width is taken from the recovered rows,
/// which must all be the same length.
///
/// # Errors
///
/// Returns `InvalidInput` for ragged or empty results and `CryptoError` if
/// a row fails to decrypt.
pub fn decrypt(private: &[u8], data: &ByteRows) -> Result<ByteRows> {
    let key = decode_private(private)?;
    if data.width() != key.size() {
        return Err(Error::invalid_input(format!(
            "RSA ciphertext rows must be b{}, got b{}",
            key.size(),
            data.width()
        )));
    }
    let plain = data
        .rows()
        .map(|row| key.decrypt(Pkcs1v15Encrypt, row).map_err(crypto_error))
        .collect::<Result<Vec<_>>>()?;
    let width = match plain.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(Error::invalid_input("cannot infer plaintext width")),
    };
    if plain.iter().any(|row| row.len() != width) {
        return Err(Error::invalid_input("decrypted rows differ in length"));
    }
    ByteRows::from_rows(width, plain)
}

/// Signs the SHA-256 digest of each row.
///
/// # Errors
///
/// Returns a key error or `CryptoError` if signing fails.
pub fn sign(private: &[u8], messages: &ByteRows) -> Result<ByteRows> {
    let key = decode_private(private)?;
    let mut out = ByteRows::new(key.size())?;
    for message in messages.rows() {
        let signature = key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &sha256(message))
            .map_err(crypto_error)?;
        out.push(&signature)?;
    }
    Ok(out)
}

/// Verifies each message row against the matching signature row, giving
/// 1 for a valid signature and 0 otherwise.
///
/// # Errors
///
/// Returns `MalformedSignature` if signature rows are not the modulus size
/// and `LengthMismatch` if the row counts differ.
pub fn verify(public: &[u8], messages: &ByteRows, signatures: &ByteRows) -> Result<Vec<i64>> {
    let key = decode_public(public)?;
    if signatures.width() != key.size() {
        return Err(Error::malformed_signature(format!(
            "RSA signatures must be {} bytes, got {}",
            key.size(),
            signatures.width()
        )));
    }
    if messages.len() != signatures.len() {
        return Err(Error::length_mismatch(messages.len(), signatures.len()));
    }
    Ok(messages
        .rows()
        .zip(signatures.rows())
        .map(|(message, signature)| {
            i64::from(
                key.verify(Pkcs1v15Sign::new::<Sha256>(), &sha256(message), signature)
                    .is_ok(),
            )
        })
        .collect())
}
