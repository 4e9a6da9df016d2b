//! Cipher, digest and signature commands.
//!
//! Data operands are byte-oriented arrays processed row by row; keys, IVs
//! and signatures-of-one are single byte rows. Operand types are checked
//! before any key material is decoded, so a wrong-typed operand always
//! reports `TypeMismatch` rather than a key error.

use segrun_crypto::{aes, ecdsa, grain, rsa, sha};
use segrun_foundation::{Arity, ByteRows, Result, Value};

use super::CommandContext;
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The crypto command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    use Arity::Exact;
    use Outputs::Leading;
    vec![
        CommandSpec::new("aes256_encrypt", Exact(3), Leading(1), aes256_encrypt),
        CommandSpec::new("aes256_decrypt", Exact(3), Leading(1), aes256_decrypt),
        CommandSpec::new("aes256_ctr", Exact(4), Leading(1), aes256_ctr),
        CommandSpec::new("grain128aeadv2", Exact(5), Leading(1), grain128aeadv2),
        CommandSpec::new("grain128_xor", Exact(4), Leading(1), grain128_xor),
        CommandSpec::new("sha3_256", Exact(2), Leading(1), sha3_256).with_aliases(&["sha"]),
        CommandSpec::new("sha256", Exact(2), Leading(1), sha256),
        CommandSpec::new("ecdsa256_keygen", Exact(1), Leading(1), ecdsa256_keygen),
        CommandSpec::new("ecdsa256_public_key", Exact(2), Leading(1), ecdsa256_public_key),
        CommandSpec::new("ecdsa256_sign", Exact(3), Leading(1), ecdsa256_sign),
        CommandSpec::new("ecdsa256_verify", Exact(4), Leading(1), ecdsa256_verify),
        CommandSpec::new("rsa_keygen", Exact(1), Leading(1), rsa_keygen),
        CommandSpec::new("rsa_public_key", Exact(2), Leading(1), rsa_public_key),
        CommandSpec::new("rsa_encrypt", Exact(3), Leading(1), rsa_encrypt),
        CommandSpec::new("rsa_decrypt", Exact(3), Leading(1), rsa_decrypt),
        CommandSpec::new("rsa_sign", Exact(3), Leading(1), rsa_sign),
        CommandSpec::new("rsa_verify", Exact(4), Leading(1), rsa_verify),
    ]
}

// =============================================================================
// Operand helpers
// =============================================================================

/// Rows of a byte-oriented data operand.
fn rows(ctx: &CommandContext<'_>, op: &Operand) -> Result<ByteRows> {
    Ok(ctx.value(op)?.rows()?.clone())
}

/// A single byte row: a key, an IV, or one message.
fn row(ctx: &CommandContext<'_>, op: &Operand) -> Result<Vec<u8>> {
    Ok(ctx.value(op)?.single_row()?.to_vec())
}

// =============================================================================
// Symmetric
// =============================================================================

/// `aes256_encrypt(result, data, key)`: ECB over `b16` rows.
fn aes256_encrypt(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[1])?;
    let key = row(ctx, &ops[2])?;
    ctx.set(&ops[0], aes::encrypt_blocks(&data, &key)?.into())
}

/// `aes256_decrypt(result, data, key)`.
fn aes256_decrypt(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[1])?;
    let key = row(ctx, &ops[2])?;
    ctx.set(&ops[0], aes::decrypt_blocks(&data, &key)?.into())
}

/// `aes256_ctr(result, data, key, iv)`: its own inverse.
fn aes256_ctr(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[1])?;
    let key = row(ctx, &ops[2])?;
    let iv = row(ctx, &ops[3])?;
    ctx.set(&ops[0], aes::apply_ctr(&data, &key, &iv)?.into())
}

/// `grain128aeadv2(result, key, iv, width, length)`: raw keystream rows.
fn grain128aeadv2(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let key = row(ctx, &ops[1])?;
    let iv = row(ctx, &ops[2])?;
    let width = ctx.len(&ops[3])?;
    let length = ctx.len(&ops[4])?;
    ctx.set(&ops[0], grain::keystream_rows(&key, &iv, width, length)?.into())
}

/// `grain128_xor(result, data, key, iv)`.
fn grain128_xor(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[1])?;
    let key = row(ctx, &ops[2])?;
    let iv = row(ctx, &ops[3])?;
    ctx.set(&ops[0], grain::apply(&data, &key, &iv)?.into())
}

// =============================================================================
// Digests
// =============================================================================

/// `sha3_256(result, source)`: one `b32` digest per row.
fn sha3_256(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[1])?;
    ctx.set(&ops[0], sha::sha3_256_rows(&data)?.into())
}

/// `sha256(result, source)`.
fn sha256(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[1])?;
    ctx.set(&ops[0], sha::sha256_rows(&data)?.into())
}

// =============================================================================
// ECDSA
// =============================================================================

/// `ecdsa256_keygen(result)`: a `b32` private key from the session RNG.
fn ecdsa256_keygen(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let private = ecdsa::keygen(ctx.rng());
    ctx.set(&ops[0], Value::bytes(&private)?)
}

/// `ecdsa256_public_key(result, private)`: the `b33` compressed point.
fn ecdsa256_public_key(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let private = row(ctx, &ops[1])?;
    ctx.set(&ops[0], Value::bytes(&ecdsa::public_key(&private)?)?)
}

/// `ecdsa256_sign(result, private, message)`: one `b64` signature per row.
fn ecdsa256_sign(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let messages = rows(ctx, &ops[2])?;
    let private = row(ctx, &ops[1])?;
    ctx.set(&ops[0], ecdsa::sign(&private, &messages)?.into())
}

/// `ecdsa256_verify(result, public, message, signature)`: 0/1 per row.
fn ecdsa256_verify(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let messages = rows(ctx, &ops[2])?;
    let signatures = rows(ctx, &ops[3])?;
    let public = row(ctx, &ops[1])?;
    let out = ecdsa::verify(&public, &messages, &signatures)?;
    ctx.set(&ops[0], Value::IntegerArray(out))
}

// =============================================================================
// RSA
// =============================================================================

/// `rsa_keygen(result)`: a fixed-width private key of the configured size.
fn rsa_keygen(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let bits = ctx.config().rsa_bits;
    let private = rsa::keygen(ctx.rng(), bits)?;
    ctx.set(&ops[0], Value::bytes(&private)?)
}

/// `rsa_public_key(result, private)`.
fn rsa_public_key(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let private = row(ctx, &ops[1])?;
    ctx.set(&ops[0], Value::bytes(&rsa::public_key(&private)?)?)
}

/// `rsa_encrypt(result, public, data)`: PKCS#1 v1.5, one ciphertext per row.
fn rsa_encrypt(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[2])?;
    let public = row(ctx, &ops[1])?;
    let out = rsa::encrypt(ctx.rng(), &public, &data)?;
    ctx.set(&ops[0], out.into())
}

/// `rsa_decrypt(result, private, data)`.
fn rsa_decrypt(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let data = rows(ctx, &ops[2])?;
    let private = row(ctx, &ops[1])?;
    ctx.set(&ops[0], rsa::decrypt(&private, &data)?.into())
}

/// `rsa_sign(result, private, message)`.
fn rsa_sign(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let messages = rows(ctx, &ops[2])?;
    let private = row(ctx, &ops[1])?;
    ctx.set(&ops[0], rsa::sign(&private, &messages)?.into())
}

/// `rsa_verify(result, public, message, signature)`: 0/1 per row.
fn rsa_verify(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let messages = rows(ctx, &ops[2])?;
    let signatures = rows(ctx, &ops[3])?;
    let public = row(ctx, &ops[1])?;
    let out = rsa::verify(&public, &messages, &signatures)?;
    ctx.set(&ops[0], Value::IntegerArray(out))
}
