//! List-map commands.
//!
//! A list-map's key columns are passed as trailing operands, one per key
//! typecode, so a map keyed on `ib32` takes an `i` column and a `b32`
//! column. Commands that change a map write it back in place.

use std::borrow::Cow;

use segrun_foundation::{Arity, Error, ListMap, Result, TypeCode, Value};

use super::{CommandContext, boolean};
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The list-map command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    use Arity::{Exact, Variadic};
    use Outputs::{AllBut, Leading};
    vec![
        CommandSpec::new("newlistmap", Variadic(3), Leading(1), newlistmap),
        CommandSpec::new("listmap_keys", Variadic(2), AllBut(1), keys),
        CommandSpec::new("listmap_getitem", Variadic(3), Leading(1), getitem),
        CommandSpec::new("listmap_contains", Variadic(3), Leading(1), contains),
        CommandSpec::new("listmap_additem", Variadic(5), Leading(2), additem),
        CommandSpec::new("listmap_removeitem", Variadic(7), Leading(3), removeitem),
        CommandSpec::new("listmap_intersectitem", Variadic(3), Leading(1), intersectitem),
        CommandSpec::new("listmap_keys_unique", Variadic(3), Leading(1), keys_unique),
        CommandSpec::new("listmap_setitems", Exact(2), Leading(1), setitems),
        CommandSpec::new("listmap_copy", Exact(2), Leading(1), copy),
    ]
}

fn as_map(value: &Value) -> Result<&ListMap> {
    value
        .as_listmap()
        .ok_or_else(|| Error::type_mismatch("listmap", value.value_type()))
}

/// Resolves key column operands.
fn columns<'c>(ctx: &'c CommandContext<'_>, ops: &[Operand]) -> Result<Vec<Cow<'c, Value>>> {
    ops.iter().map(|op| ctx.value(op)).collect()
}

fn refs<'v>(cols: &'v [Cow<'_, Value>]) -> Vec<&'v Value> {
    cols.iter().map(|c| &**c).collect()
}

/// Checks that exactly one column was given per key typecode.
fn check_columns(map: &ListMap, given: usize) -> Result<()> {
    if given == map.codes().len() {
        Ok(())
    } else {
        Err(Error::length_mismatch(map.codes().len(), given))
    }
}

/// `newlistmap(result, typecodes, columns...)`.
fn newlistmap(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let codes = TypeCode::parse_many(&ctx.text(&ops[1])?)?;
    let out = {
        let cols = columns(ctx, &ops[2..])?;
        ListMap::from_columns(codes, &refs(&cols))?
    };
    ctx.set(&ops[0], out.into())
}

/// `listmap_keys(results..., map)`: one output per key column.
fn keys(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let (outputs, map) = ops.split_at(ops.len() - 1);
    let cols = {
        let value = ctx.value(&map[0])?;
        let map = as_map(&value)?;
        check_columns(map, outputs.len())?;
        map.key_columns()?
    };
    ctx.set_all(outputs, cols)
}

/// `listmap_getitem(result, map, columns..., [default])`: positions.
fn getitem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = {
        let value = ctx.value(&ops[1])?;
        let map = as_map(&value)?;
        let n = map.codes().len();
        let rest = &ops[2..];
        let default = match rest.len() {
            len if len == n => None,
            len if len == n + 1 => Some(ctx.int(&rest[n])?),
            len => return Err(Error::length_mismatch(n, len)),
        };
        let cols = columns(ctx, &rest[..n])?;
        Value::IntegerArray(map.lookup(&refs(&cols), default)?)
    };
    ctx.set(&ops[0], out)
}

/// `listmap_contains(result, map, columns...)`: 0/1 per key.
fn contains(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = {
        let value = ctx.value(&ops[1])?;
        let map = as_map(&value)?;
        check_columns(map, ops.len() - 2)?;
        let cols = columns(ctx, &ops[2..])?;
        Value::IntegerArray(map.contains(&refs(&cols))?)
    };
    ctx.set(&ops[0], out)
}

/// `listmap_additem(added, positions, map, ignore, columns...)`.
///
/// `added` receives a list-map of the keys actually inserted and
/// `positions` their new positions. With `ignore` set, duplicates are
/// skipped rather than failing the command.
fn additem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let ignore = ctx.flag(&ops[3])?;
    let (map, added, positions) = {
        let mut map = as_map(ctx.target(&ops[2])?)?.clone();
        check_columns(&map, ops.len() - 4)?;
        let cols = columns(ctx, &ops[4..])?;
        let (added, positions) = map.insert(&refs(&cols), ignore)?;
        let added: Vec<&Value> = added.iter().collect();
        let added = ListMap::from_columns(map.codes().to_vec(), &added)?;
        (map, added, positions)
    };
    ctx.set_all(
        &ops[..3],
        vec![added.into(), Value::IntegerArray(positions), map.into()],
    )
}

/// `listmap_removeitem(removed, moved_from, moved_to, map, ignore, columns...)`.
///
/// Remaining keys are compacted; `moved_from` and `moved_to` describe
/// every surviving key whose position changed.
fn removeitem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let ignore = ctx.flag(&ops[4])?;
    let (map, removal) = {
        let mut map = as_map(ctx.target(&ops[3])?)?.clone();
        check_columns(&map, ops.len() - 5)?;
        let cols = columns(ctx, &ops[5..])?;
        let removal = map.remove(&refs(&cols), ignore)?;
        (map, removal)
    };
    ctx.set_all(
        &ops[..4],
        vec![
            Value::IntegerArray(removal.removed),
            Value::IntegerArray(removal.moved_from),
            Value::IntegerArray(removal.moved_to),
            map.into(),
        ],
    )
}

/// `listmap_intersectitem(result, map, columns...)`: the map's keys that
/// also appear in the columns, in map order.
fn intersectitem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = {
        let value = ctx.value(&ops[1])?;
        let map = as_map(&value)?;
        check_columns(map, ops.len() - 2)?;
        let cols = columns(ctx, &ops[2..])?;
        map.intersect(&refs(&cols))?
    };
    ctx.set(&ops[0], out.into())
}

/// `listmap_keys_unique(result, map, columns...)`: 1 if the rows are
/// pairwise distinct under the map's key layout.
fn keys_unique(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = {
        let value = ctx.value(&ops[1])?;
        let map = as_map(&value)?;
        check_columns(map, ops.len() - 2)?;
        let cols = columns(ctx, &ops[2..])?;
        boolean(map.rows_unique(&refs(&cols))?)
    };
    ctx.set(&ops[0], out)
}

/// `listmap_setitems(result, source)`: copies any value.
fn setitems(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = ctx.value(&ops[1])?.into_owned();
    ctx.set(&ops[0], out)
}

/// `listmap_copy(result, map)`.
fn copy(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = as_map(&*ctx.value(&ops[1])?)?.clone();
    ctx.set(&ops[0], out.into())
}
