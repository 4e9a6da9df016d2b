//! Elementwise operators.
//!
//! One implementation serves every binary opcode and another every unary
//! opcode; each reads the operator from the opcode it was invoked under.

use segrun_foundation::arith::{self, BinaryOp, UnaryOp};
use segrun_foundation::{Arity, Result};

use super::CommandContext;
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The operator command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    let binaries = BinaryOp::ALL
        .iter()
        .map(|op| CommandSpec::new(op.name(), Arity::Exact(3), Outputs::Leading(1), binary));
    let unaries = UnaryOp::ALL
        .iter()
        .map(|op| CommandSpec::new(op.name(), Arity::Exact(2), Outputs::Leading(1), unary));
    binaries
        .chain(unaries)
        .chain(std::iter::once(CommandSpec::new(
            "divmod",
            Arity::Exact(3),
            Outputs::Leading(1),
            divmod,
        )))
        .collect()
}

/// `<op>(result, a, b)`. Length-1 operands broadcast.
fn binary(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let op: BinaryOp = ctx.opcode().parse()?;
    let out = arith::binary(op, &*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?)?;
    ctx.set(&ops[0], out)
}

/// `<op>(result, a)`.
fn unary(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let op: UnaryOp = ctx.opcode().parse()?;
    let out = arith::unary(op, &*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], out)
}

/// `divmod(result, a, b)`: a pair of floor quotient and remainder.
fn divmod(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arith::divmod(&*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?)?;
    ctx.set(&ops[0], out)
}
