//! Node trees and pairs.

use segrun_foundation::{Arity, Error, NodeTree, Result, Value};

use super::{CommandContext, positions};
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The aggregate command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    use Arity::{Exact, Range};
    use Outputs::{Leading, None};
    vec![
        CommandSpec::new("newnode", Range(2, 3), Leading(1), newnode),
        CommandSpec::new("addchild", Range(2, 3), None, addchild),
        CommandSpec::new("nodechildren", Exact(3), Leading(1), nodechildren),
        CommandSpec::new("nodepayload", Exact(3), Leading(1), nodepayload),
        CommandSpec::new("pair", Exact(3), Leading(1), pair),
        CommandSpec::new("unpair", Exact(3), Leading(2), unpair),
    ]
}

fn as_tree(value: &Value) -> Result<&NodeTree> {
    value
        .as_node()
        .ok_or_else(|| Error::type_mismatch("node", value.value_type()))
}

/// `newnode(result, label, [payload])`.
fn newnode(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let label = ctx.text(&ops[1])?;
    let payload = match ops.get(2) {
        Some(op) => Some(ctx.value(op)?.into_owned()),
        None => None,
    };
    ctx.set(&ops[0], NodeTree::new(label, payload).into())
}

/// `addchild(target, child, [parent])`: grafts a copy of the child tree
/// under node `parent` (default the root) of the target, in place.
fn addchild(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let parent = match ops.get(2) {
        Some(op) => ctx.len(op)?,
        None => 0,
    };
    let tree = {
        let mut tree = as_tree(ctx.target(&ops[0])?)?.clone();
        let child = ctx.value(&ops[1])?;
        tree.attach(parent, as_tree(&child)?)?;
        tree
    };
    ctx.set(&ops[0], tree.into())
}

/// `nodechildren(result, target, index)`: child node ids.
fn nodechildren(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let id = ctx.len(&ops[2])?;
    let out = {
        let value = ctx.value(&ops[1])?;
        positions(&as_tree(&value)?.node(id)?.children)
    };
    ctx.set(&ops[0], out)
}

/// `nodepayload(result, target, index)`.
fn nodepayload(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let id = ctx.len(&ops[2])?;
    let out = {
        let value = ctx.value(&ops[1])?;
        as_tree(&value)?
            .node(id)?
            .payload
            .clone()
            .ok_or_else(|| Error::invalid_input(format!("node {id} has no payload")))?
    };
    ctx.set(&ops[0], out)
}

/// `pair(result, a, b)`.
fn pair(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let first = ctx.value(&ops[1])?.into_owned();
    let second = ctx.value(&ops[2])?.into_owned();
    ctx.set(&ops[0], Value::pair(first, second))
}

/// `unpair(first, second, pair)`.
fn unpair(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let (first, second) = {
        let value = ctx.value(&ops[2])?;
        let (a, b) = value
            .as_pair()
            .ok_or_else(|| Error::type_mismatch("pair", value.value_type()))?;
        (a.clone(), b.clone())
    };
    ctx.set_all(&ops[..2], vec![first, second])
}
