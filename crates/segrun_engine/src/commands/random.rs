//! Session-seeded random arrays.
//!
//! Every draw comes from the session's `ChaCha20Rng`, so a segment run
//! against a session seeded the same way produces the same arrays.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use segrun_foundation::{
    Arity, ByteRows, ED25519_SCALAR_WIDTH, Error, Result, TypeCode, Value, ValueType,
    check_array_size,
};

use super::{CommandContext, positions};
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The random command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("randomarray", Arity::Range(3, 5), Outputs::Leading(1), randomarray),
        CommandSpec::new("randomperm", Arity::Exact(2), Outputs::Leading(1), randomperm),
    ]
}

/// `randomarray(result, typecode, length, [min, max])`.
///
/// `i` draws from `[min, max)` or the full range; `f` from `[min, max)`,
/// default `[0, 1)`. Byte typecodes take no bounds. `I` scalars are
/// clamped below 2^252 so they are valid reduced scalars.
fn randomarray(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let code = ctx.typecode(&ops[1])?;
    let len = ctx.len(&ops[2])?;
    check_array_size(len, code.width())?;
    let bounds = &ops[3..];
    if bounds.len() == 1 {
        return Err(Error::invalid_input("randomarray takes both min and max or neither"));
    }

    let out = match code {
        TypeCode::Integer => {
            let range = match bounds {
                [lo, hi] => Some((ctx.int(lo)?, ctx.int(hi)?)),
                _ => None,
            };
            if let Some((lo, hi)) = range {
                if lo >= hi {
                    return Err(Error::invalid_input(format!("empty range [{lo}, {hi})")));
                }
            }
            let rng = ctx.rng();
            Value::IntegerArray(
                (0..len)
                    .map(|_| match range {
                        Some((lo, hi)) => rng.gen_range(lo..hi),
                        None => rng.r#gen(),
                    })
                    .collect(),
            )
        }
        TypeCode::Float => {
            let (lo, hi) = match bounds {
                [lo, hi] => (ctx.number(lo)?, ctx.number(hi)?),
                _ => (0.0, 1.0),
            };
            if !(lo < hi && (hi - lo).is_finite()) {
                return Err(Error::invalid_input(format!("empty range [{lo}, {hi})")));
            }
            let rng = ctx.rng();
            Value::FloatArray((0..len).map(|_| rng.gen_range(lo..hi)).collect())
        }
        TypeCode::ByteArray(width) => {
            no_bounds(bounds, code)?;
            Value::ByteArrayArray(random_rows(ctx, width, len, |_| {})?)
        }
        TypeCode::Ed25519Int => {
            no_bounds(bounds, code)?;
            let rows = random_rows(ctx, ED25519_SCALAR_WIDTH, len, |row| {
                row[ED25519_SCALAR_WIDTH - 1] &= 0x0f;
            })?;
            Value::Ed25519IntArray(rows)
        }
        TypeCode::Ed25519 => {
            return Err(Error::type_mismatch(
                "i, f, bN or I",
                ValueType::Array(TypeCode::Ed25519),
            ));
        }
    };
    ctx.set(&ops[0], out)
}

fn no_bounds(bounds: &[Operand], code: TypeCode) -> Result<()> {
    if bounds.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid_input(format!("{code} arrays take no bounds")))
    }
}

fn random_rows(
    ctx: &mut CommandContext<'_>,
    width: usize,
    len: usize,
    mut fix: impl FnMut(&mut [u8]),
) -> Result<ByteRows> {
    let mut data = vec![0; check_array_size(len, width)?];
    ctx.rng().fill_bytes(&mut data);
    if width > 0 {
        for row in data.chunks_exact_mut(width) {
            fix(row);
        }
    }
    ByteRows::from_flat(width, data)
}

/// `randomperm(result, length)`: a shuffled `0..length`.
fn randomperm(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let len = ctx.len(&ops[1])?;
    check_array_size(len, size_of::<usize>())?;
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(ctx.rng());
    let out = positions(&order);
    ctx.set(&ops[0], out)
}
