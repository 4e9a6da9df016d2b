//! Integration tests for ECDSA and RSA
//!
//! Tests key layouts, sign/verify with tampering, and RSA encryption.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use segrun_crypto::{ecdsa, rsa};
use segrun_foundation::{ByteRows, ErrorKind};

fn rng() -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(42)
}

fn messages() -> ByteRows {
    ByteRows::from_flat(4, b"pay1pay2".to_vec()).unwrap()
}

// =============================================================================
// ECDSA
// =============================================================================

#[test]
fn ecdsa_key_layouts() {
    let private = ecdsa::keygen(&mut rng());
    assert_eq!(private.len(), ecdsa::PRIVATE_KEY_LEN);
    let public = ecdsa::public_key(&private).unwrap();
    assert_eq!(public.len(), ecdsa::PUBLIC_KEY_LEN);
    assert!(public[0] == 0x02 || public[0] == 0x03);
}

#[test]
fn ecdsa_sign_verify_and_tamper() {
    let private = ecdsa::keygen(&mut rng());
    let public = ecdsa::public_key(&private).unwrap();
    let signatures = ecdsa::sign(&private, &messages()).unwrap();
    assert_eq!(signatures.width(), ecdsa::SIGNATURE_LEN);
    assert_eq!(
        ecdsa::verify(&public, &messages(), &signatures).unwrap(),
        vec![1, 1]
    );

    let tampered = ByteRows::from_flat(4, b"pay1pay3".to_vec()).unwrap();
    assert_eq!(
        ecdsa::verify(&public, &tampered, &signatures).unwrap(),
        vec![1, 0]
    );
}

#[test]
fn ecdsa_malformed_inputs() {
    let private = ecdsa::keygen(&mut rng());
    let public = ecdsa::public_key(&private).unwrap();
    let short = ByteRows::from_flat(10, vec![0; 20]).unwrap();
    assert!(matches!(
        ecdsa::verify(&public, &messages(), &short).unwrap_err().kind,
        ErrorKind::MalformedSignature(_)
    ));
    assert!(matches!(
        ecdsa::public_key(&[1u8; 31]).unwrap_err().kind,
        ErrorKind::InvalidKeyLength { expected: 32, actual: 31 }
    ));
}

// =============================================================================
// RSA
// =============================================================================

#[test]
fn rsa_round_trips() {
    let mut rng = rng();
    let private = rsa::keygen(&mut rng, 1024).unwrap();
    assert_eq!(private.len(), rsa::private_key_width(128));
    let public = rsa::public_key(&private).unwrap();
    assert_eq!(public.len(), rsa::public_key_width(128));

    let cipher = rsa::encrypt(&mut rng, &public, &messages()).unwrap();
    assert_eq!(cipher.width(), 128);
    assert_eq!(rsa::decrypt(&private, &cipher).unwrap(), messages());

    let signatures = rsa::sign(&private, &messages()).unwrap();
    assert_eq!(
        rsa::verify(&public, &messages(), &signatures).unwrap(),
        vec![1, 1]
    );

    let mut forged = signatures.as_bytes().to_vec();
    forged[127] ^= 0x01;
    let forged = ByteRows::from_flat(128, forged).unwrap();
    assert_eq!(
        rsa::verify(&public, &messages(), &forged).unwrap(),
        vec![0, 1]
    );
}

#[test]
fn rsa_rejects_oversized_rows() {
    let mut rng = rng();
    let private = rsa::keygen(&mut rng, 1024).unwrap();
    let public = rsa::public_key(&private).unwrap();
    let long = ByteRows::from_flat(120, vec![0; 120]).unwrap();
    assert!(matches!(
        rsa::encrypt(&mut rng, &public, &long).unwrap_err().kind,
        ErrorKind::InvalidInput(_)
    ));
    assert!(rsa::public_key(&[0u8; 10]).is_err());
}
