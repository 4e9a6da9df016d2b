//! AES-256 in ECB block mode and CTR stream mode.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, KeyIvInit, StreamCipher};
use segrun_foundation::{ByteRows, Error, Result};

use crate::{check_key_len, crypto_error};

/// AES-256 key size in bytes.
pub const KEY_LEN: usize = 32;

/// AES block size in bytes; also the CTR IV size.
pub const BLOCK_LEN: usize = 16;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

fn cipher(key: &[u8]) -> Result<Aes256> {
    check_key_len(key, KEY_LEN)?;
    Aes256::new_from_slice(key).map_err(crypto_error)
}

fn check_blocks(data: &ByteRows) -> Result<()> {
    if data.width() == BLOCK_LEN {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "AES blocks must be b{BLOCK_LEN}, got b{}",
            data.width()
        )))
    }
}

/// Encrypts each `b16` row as one AES-256 block.
///
/// # Errors
///
/// Returns `InvalidKeyLength` for a key that is not 32 bytes and
/// `InvalidInput` if the rows are not 16 bytes wide.
pub fn encrypt_blocks(data: &ByteRows, key: &[u8]) -> Result<ByteRows> {
    let cipher = cipher(key)?;
    check_blocks(data)?;
    let mut out = data.as_bytes().to_vec();
    for chunk in out.chunks_exact_mut(BLOCK_LEN) {
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }
    ByteRows::from_flat(BLOCK_LEN, out)
}

/// Inverse of [`encrypt_blocks`].
///
/// # Errors
///
/// As for [`encrypt_blocks`].
pub fn decrypt_blocks(data: &ByteRows, key: &[u8]) -> Result<ByteRows> {
    let cipher = cipher(key)?;
    check_blocks(data)?;
    let mut out = data.as_bytes().to_vec();
    for chunk in out.chunks_exact_mut(BLOCK_LEN) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }
    ByteRows::from_flat(BLOCK_LEN, out)
}

/// XORs the AES-256-CTR keystream over the rows, treated as one
/// contiguous message. Applying it twice restores the input.
///
/// # Errors
///
/// Returns `InvalidKeyLength` if the key is not 32 bytes or the IV is not 16.
pub fn apply_ctr(data: &ByteRows, key: &[u8], iv: &[u8]) -> Result<ByteRows> {
    check_key_len(key, KEY_LEN)?;
    check_key_len(iv, BLOCK_LEN)?;
    let mut stream = Aes256Ctr::new_from_slices(key, iv).map_err(crypto_error)?;
    let mut out = data.as_bytes().to_vec();
    stream.apply_keystream(&mut out);
    ByteRows::from_flat(data.width(), out)
}
