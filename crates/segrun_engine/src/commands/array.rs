//! Array construction, indexing, search, ordering and reduction.

use segrun_foundation::array as arrays;
use segrun_foundation::convert::astype;
use segrun_foundation::{Arity, Error, ErrorKind, ReduceOp, Result, ScatterOp, Slice, TypeCode, Value};

use super::{CommandContext, boolean, count, output_name, positions};
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The array command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    use Arity::{Exact, Range, Variadic};
    use Outputs::{Leading, None};
    vec![
        CommandSpec::new("newarray", Range(3, 4), Leading(1), newarray),
        CommandSpec::new("arange", Range(2, 5), Leading(1), arange),
        CommandSpec::new("astype", Exact(3), Leading(1), convert),
        CommandSpec::new("concat", Exact(3), Leading(1), concat),
        CommandSpec::new("slicetoindices", Exact(5), Leading(1), slice_to_indices),
        CommandSpec::new("newslice", Exact(4), Leading(1), new_slice),
        CommandSpec::new("len", Exact(2), Leading(1), len),
        CommandSpec::new("setlength", Exact(2), None, set_length),
        CommandSpec::new("getitem", Range(2, 3), Leading(1), getitem),
        CommandSpec::new("setitem", Range(2, 3), Leading(1), setitem),
        CommandSpec::new("delitem", Exact(2), None, delitem),
        CommandSpec::new("del", Variadic(1), None, del),
        CommandSpec::new("index", Exact(3), Leading(1), index),
        CommandSpec::new("nonzeroindices", Exact(2), Leading(1), nonzero_indices),
        CommandSpec::new("contains", Exact(3), Leading(1), contains),
        CommandSpec::new("lookup", Range(3, 4), Leading(1), lookup),
        CommandSpec::new("select", Exact(4), Leading(1), select),
        CommandSpec::new("sorted", Range(2, 3), Leading(1), sorted).with_aliases(&["sort"]),
        CommandSpec::new("indexsorted", Exact(2), Leading(1), index_sorted),
        CommandSpec::new("cumsum", Exact(2), Leading(1), cumsum),
        CommandSpec::new("reduce", Exact(3), Leading(1), reduce),
        CommandSpec::new("reducesum", Exact(3), None, scatter),
        CommandSpec::new("reduceisum", Exact(3), None, scatter),
        CommandSpec::new("reducemin", Exact(3), None, scatter),
        CommandSpec::new("reduceimin", Exact(3), None, scatter),
        CommandSpec::new("reducemax", Exact(3), None, scatter),
        CommandSpec::new("reduceimax", Exact(3), None, scatter),
        CommandSpec::new("equalint", Exact(3), Leading(1), equal_int),
        CommandSpec::new("verify", Exact(2), Leading(1), verify).with_aliases(&["nonzero"]),
        CommandSpec::new("byteproject", Exact(5), Leading(1), byte_project),
        CommandSpec::new("calcbroadcastlength", Variadic(2), Leading(1), broadcast_length),
        CommandSpec::new("broadcastvalue", Exact(2), None, broadcast_value),
        CommandSpec::new("tolist", Exact(1), None, to_list),
        CommandSpec::new("newilist", Variadic(1), Leading(1), new_int_list),
        CommandSpec::new("newflist", Variadic(1), Leading(1), new_float_list),
    ]
}

// =============================================================================
// Construction
// =============================================================================

/// `newarray(result, typecode, length-or-values, [fill])`.
///
/// An `Int` literal is a length: the array is zero-filled, or filled with
/// the one-element `fill`. Anything else is converted to the typecode.
fn newarray(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let code = ctx.typecode(&ops[1])?;
    let value = match &ops[2] {
        Operand::Int(n) => {
            let len = usize::try_from(*n)
                .map_err(|_| Error::invalid_input(format!("negative length {n}")))?;
            match ops.get(3) {
                Some(fill) => arrays::broadcast(&astype(&*ctx.value(fill)?, code)?, len)?,
                None => Value::zeros(code, len)?,
            }
        }
        source => {
            if ops.len() > 3 {
                return Err(Error::invalid_input("a fill value needs a length"));
            }
            astype(&*ctx.value(source)?, code)?
        }
    };
    ctx.set(&ops[0], value)
}

/// `arange(result, length)` or `arange(result, start, stop, [step], [typecode])`.
fn arange(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let code = match ops.get(4) {
        Some(op) => ctx.typecode(op)?,
        None => TypeCode::Integer,
    };
    let value = if ops.len() == 2 {
        arrays::arange(0, ctx.int(&ops[1])?, 1)?
    } else if code == TypeCode::Float {
        let step = ops.get(3).map_or(Ok(1.0), |op| ctx.number(op))?;
        arrays::arange_float(ctx.number(&ops[1])?, ctx.number(&ops[2])?, step)?
    } else {
        let step = ops.get(3).map_or(Ok(1), |op| ctx.int(op))?;
        astype(&arrays::arange(ctx.int(&ops[1])?, ctx.int(&ops[2])?, step)?, code)?
    };
    ctx.set(&ops[0], value)
}

fn convert(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let code = ctx.typecode(&ops[2])?;
    let out = astype(&*ctx.value(&ops[1])?, code)?;
    ctx.set(&ops[0], out)
}

fn concat(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::concat(&*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?)?;
    ctx.set(&ops[0], out)
}

fn new_int_list(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let mut out = Vec::new();
    for op in &ops[1..] {
        out.extend_from_slice(ctx.value(op)?.ints()?);
    }
    ctx.set(&ops[0], Value::IntegerArray(out))
}

#[allow(clippy::cast_precision_loss)]
fn new_float_list(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let mut out = Vec::new();
    for op in &ops[1..] {
        let value = ctx.value(op)?;
        match &*value {
            Value::IntegerArray(xs) => out.extend(xs.iter().map(|&x| x as f64)),
            other => out.extend_from_slice(other.floats()?),
        }
    }
    ctx.set(&ops[0], Value::FloatArray(out))
}

// =============================================================================
// Slices and lengths
// =============================================================================

/// A slice bound: an integer, or the text `none` for an omitted bound.
fn bound(ctx: &CommandContext<'_>, op: &Operand) -> Result<Option<i64>> {
    match op {
        Operand::Text(text) if text == "none" => Ok(Option::None),
        other => ctx.int(other).map(Some),
    }
}

fn read_slice(ctx: &CommandContext<'_>, ops: &[Operand]) -> Result<Slice> {
    Ok(Slice::new(
        bound(ctx, &ops[0])?,
        bound(ctx, &ops[1])?,
        bound(ctx, &ops[2])?,
    ))
}

fn slice_to_indices(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let slice = read_slice(ctx, &ops[1..4])?;
    let indices = slice.indices(ctx.len(&ops[4])?)?;
    ctx.set(&ops[0], positions(&indices))
}

fn new_slice(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let slice = read_slice(ctx, &ops[1..4])?;
    if slice.step == Some(0) {
        return Err(Error::new(ErrorKind::ZeroStep));
    }
    ctx.set(&ops[0], Value::Slice(slice))
}

fn len(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let n = arrays::length(&*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], count(n))
}

fn set_length(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::set_length(ctx.target(&ops[0])?, ctx.len(&ops[1])?)?;
    ctx.set(&ops[0], out)
}

// =============================================================================
// Indexing
// =============================================================================

/// `getitem(result, target, [keys])`. Without keys the target is copied.
/// On a pair, key 0 or 1 selects a half.
fn getitem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = {
        let target = ctx.value(&ops[1])?;
        match ops.get(2) {
            Option::None => target.into_owned(),
            Some(keys) => {
                let keys = ctx.value(keys)?;
                match target.as_pair() {
                    Some((first, second)) => match keys.single_int()? {
                        0 => first.clone(),
                        1 => second.clone(),
                        k => return Err(Error::index_out_of_range(k, 2)),
                    },
                    Option::None => arrays::get_items(&target, &keys)?,
                }
            }
        }
    };
    ctx.set(&ops[0], out)
}

/// `setitem(target, values, [keys])`. Without keys the whole target is
/// replaced, and the target need not exist yet.
fn setitem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let name = output_name(&ops[0])?;
    let out = {
        let values = ctx.value(&ops[1])?;
        match ops.get(2) {
            Option::None if !ctx.store().contains(name) => values.into_owned(),
            keys => {
                let keys = keys.map(|k| ctx.value(k)).transpose()?;
                arrays::set_items(ctx.store().get(name)?, keys.as_deref(), &values)?
            }
        }
    };
    ctx.set(&ops[0], out)
}

fn delitem(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::delete_items(ctx.target(&ops[0])?, &*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], out)
}

/// `del(names...)`: unbinds variables.
fn del(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    for op in ops {
        ctx.store_mut().delete(output_name(op)?)?;
    }
    Ok(Response::Ack)
}

// =============================================================================
// Search
// =============================================================================

/// `index(result, target, values)`: first position of each value, or -1.
fn index(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::index_of(&*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?)?;
    ctx.set(&ops[0], Value::IntegerArray(out))
}

/// `contains(result, target, values)`: 1 where `index` finds the value.
fn contains(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::contains(&*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?)?;
    ctx.set(&ops[0], Value::IntegerArray(out))
}

fn nonzero_indices(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::nonzero_indices(&*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], Value::IntegerArray(out))
}

/// `lookup(result, target, keys, [default])`.
fn lookup(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = {
        let default = ops.get(3).map(|op| ctx.value(op)).transpose()?;
        arrays::lookup(&*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?, default.as_deref())?
    };
    ctx.set(&ops[0], out)
}

fn select(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::select(
        &*ctx.value(&ops[1])?,
        &*ctx.value(&ops[2])?,
        &*ctx.value(&ops[3])?,
    )?;
    ctx.set(&ops[0], out)
}

// =============================================================================
// Ordering
// =============================================================================

/// `sorted(result, target, [descending])`. Stable.
fn sorted(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let descending = ops.get(2).map_or(Ok(false), |op| ctx.flag(op))?;
    let out = arrays::sorted(&*ctx.value(&ops[1])?, descending)?;
    ctx.set(&ops[0], out)
}

fn index_sorted(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let order = arrays::argsort(&*ctx.value(&ops[1])?, false)?;
    ctx.set(&ops[0], positions(&order))
}

// =============================================================================
// Reduction
// =============================================================================

fn cumsum(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = arrays::cumsum(&*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], out)
}

/// `reduce(result, target, op)` with op one of `sum min max and or xor`.
fn reduce(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let op: ReduceOp = ctx.text(&ops[2])?.parse()?;
    let out = arrays::reduce(&*ctx.value(&ops[1])?, op)?;
    ctx.set(&ops[0], out)
}

/// `reduce{i,}{sum,min,max}(target, values, keys)`: in-place scatter.
fn scatter(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let (op, accumulate) = match ctx.opcode() {
        "reducesum" => (ScatterOp::Sum, false),
        "reduceisum" => (ScatterOp::Sum, true),
        "reducemin" => (ScatterOp::Min, false),
        "reduceimin" => (ScatterOp::Min, true),
        "reducemax" => (ScatterOp::Max, false),
        "reduceimax" => (ScatterOp::Max, true),
        other => return Err(Error::unknown_opcode(other)),
    };
    let out = arrays::scatter(
        ctx.target(&ops[0])?,
        &*ctx.value(&ops[2])?,
        &*ctx.value(&ops[1])?,
        op,
        accumulate,
    )?;
    ctx.set(&ops[0], out)
}

fn equal_int(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let equal = arrays::equal_ints(&*ctx.value(&ops[1])?, &*ctx.value(&ops[2])?)?;
    ctx.set(&ops[0], boolean(equal))
}

/// `verify(result, target)`: 1 if every element is non-zero.
fn verify(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let ok = arrays::all_nonzero(&*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], boolean(ok))
}

// =============================================================================
// Reshaping
// =============================================================================

/// `byteproject(result, source, width, dest-positions, source-positions)`.
fn byte_project(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let width = ctx.len(&ops[2])?;
    let out = arrays::byte_project(
        &*ctx.value(&ops[1])?,
        width,
        &*ctx.value(&ops[3])?,
        &*ctx.value(&ops[4])?,
    )?;
    ctx.set(&ops[0], out)
}

fn broadcast_length(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let lengths = ops[1..]
        .iter()
        .map(|op| ctx.int(op))
        .collect::<Result<Vec<_>>>()?;
    ctx.set(&ops[0], Value::IntegerArray(vec![arrays::broadcast_length(&lengths)]))
}

/// `broadcastvalue(target, length)`: expands a one-element array in place.
/// An array already of that length is left alone.
fn broadcast_value(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let len = ctx.len(&ops[1])?;
    let target = ctx.target(&ops[0])?;
    let out = if arrays::length(target)? == len {
        target.clone()
    } else {
        arrays::broadcast(target, len)?
    };
    ctx.set(&ops[0], out)
}

/// `tolist(target)`: renders an array as text.
fn to_list(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    render(&*ctx.value(&ops[0])?).map(Response::Text)
}

fn render(value: &Value) -> Result<String> {
    match value {
        Value::IntegerArray(xs) => Ok(format!("{xs:?}")),
        Value::FloatArray(xs) => Ok(format!("{xs:?}")),
        other => {
            let rows: Vec<String> = other
                .rows()?
                .rows()
                .map(|row| row.iter().map(|b| format!("{b:02x}")).collect())
                .collect();
            Ok(format!("[{}]", rows.join(", ")))
        }
    }
}
