//! Integration tests for AES, Grain and SHA
//!
//! Tests known-answer vectors, involutions, and key-size checks.

use segrun_crypto::{aes, grain, sha};
use segrun_foundation::{ByteRows, ErrorKind};

fn hex(text: &str) -> Vec<u8> {
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).unwrap())
        .collect()
}

fn aes_key() -> Vec<u8> {
    (0u8..32).collect()
}

// =============================================================================
// AES
// =============================================================================

#[test]
fn aes256_known_answer() {
    let plain = ByteRows::from_flat(16, hex("00112233445566778899aabbccddeeff")).unwrap();
    let cipher = aes::encrypt_blocks(&plain, &aes_key()).unwrap();
    assert_eq!(cipher.as_bytes(), hex("8ea2b7ca516745bfeafc49904b496089").as_slice());
    assert_eq!(aes::decrypt_blocks(&cipher, &aes_key()).unwrap(), plain);
}

#[test]
fn aes_rows_are_independent_blocks() {
    let plain = ByteRows::from_flat(16, [[7u8; 16], [7u8; 16]].concat()).unwrap();
    let cipher = aes::encrypt_blocks(&plain, &aes_key()).unwrap();
    assert_eq!(cipher.row(0), cipher.row(1));
}

#[test]
fn aes_key_and_block_checks() {
    let plain = ByteRows::from_flat(16, vec![0; 16]).unwrap();
    let err = aes::encrypt_blocks(&plain, &[0u8; 16]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidKeyLength { expected: 32, actual: 16 });

    let narrow = ByteRows::from_flat(8, vec![0; 8]).unwrap();
    assert!(matches!(
        aes::encrypt_blocks(&narrow, &aes_key()).unwrap_err().kind,
        ErrorKind::InvalidInput(_)
    ));
}

#[test]
fn aes_ctr_is_an_involution() {
    let data = ByteRows::from_flat(5, b"hello world!!!!".to_vec()).unwrap();
    let iv = [9u8; 16];
    let once = aes::apply_ctr(&data, &aes_key(), &iv).unwrap();
    assert_ne!(once, data);
    assert_eq!(aes::apply_ctr(&once, &aes_key(), &iv).unwrap(), data);
    assert!(aes::apply_ctr(&data, &aes_key(), &[0u8; 12]).is_err());
}

// =============================================================================
// Grain
// =============================================================================

#[test]
fn grain_keystream_is_deterministic() {
    let key = [1u8; 16];
    let iv = [2u8; 12];
    let a = grain::keystream(&key, &iv, 32).unwrap();
    let b = grain::keystream(&key, &iv, 32).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, grain::keystream(&key, &[3u8; 12], 32).unwrap());
}

#[test]
fn grain_zero_key_keystream() {
    let stream = grain::keystream(&[0u8; 16], &[0u8; 12], 16).unwrap();
    assert_eq!(
        stream,
        [
            0x37, 0x80, 0xeb, 0x2d, 0x62, 0x74, 0xac, 0x2c, 0xea, 0xb4, 0x11, 0x6c, 0x85, 0xe0,
            0x12, 0x2b
        ]
    );
}

#[test]
fn grain_rows_are_a_prefix_split() {
    let key = [1u8; 16];
    let iv = [2u8; 12];
    let rows = grain::keystream_rows(&key, &iv, 4, 3).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.as_bytes(), grain::keystream(&key, &iv, 12).unwrap().as_slice());
}

#[test]
fn grain_xor_round_trip() {
    let key = [5u8; 16];
    let iv = [6u8; 12];
    let data = ByteRows::from_flat(3, b"abcdef".to_vec()).unwrap();
    let sealed = grain::apply(&data, &key, &iv).unwrap();
    assert_eq!(grain::apply(&sealed, &key, &iv).unwrap(), data);
    assert!(grain::apply(&data, &[0u8; 15], &iv).is_err());
}

// =============================================================================
// SHA
// =============================================================================

#[test]
fn sha3_256_of_empty_row() {
    let rows = ByteRows::from_rows(1, Vec::<Vec<u8>>::new()).unwrap();
    assert!(sha::sha3_256_rows(&rows).unwrap().is_empty());

    let digest = sha::sha3_256_rows(&ByteRows::from_flat(3, b"abc".to_vec()).unwrap()).unwrap();
    assert_eq!(
        digest.as_bytes(),
        hex("3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532").as_slice()
    );
}

#[test]
fn sha256_known_answer() {
    let digest = sha::sha256_rows(&ByteRows::from_flat(3, b"abc".to_vec()).unwrap()).unwrap();
    assert_eq!(
        digest.as_bytes(),
        hex("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad").as_slice()
    );
    assert_eq!(digest.width(), sha::DIGEST_LEN);
}
