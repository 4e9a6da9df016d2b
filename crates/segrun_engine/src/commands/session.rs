//! Session identity, peers, and the auxiliary store.
//!
//! Auxiliary store calls pass straight through to the configured
//! [`AuxStore`](crate::context::AuxStore); a miss is `KeyNotFound` and a
//! store failure is `AuxStoreError`.

use segrun_foundation::{Arity, Error, ErrorKind, Result, Value};

use super::{CommandContext, ident, output_name};
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};

/// The session command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    use Arity::Exact;
    use Outputs::Leading;
    vec![
        CommandSpec::new("init", Exact(1), Leading(1), init),
        CommandSpec::new("netinit", Exact(2), Leading(2), netinit),
        CommandSpec::new("session", Exact(1), Leading(1), session),
        CommandSpec::new("clearvariablestore", Exact(0), Outputs::None, clearvariablestore),
        CommandSpec::new("auxdb_read", Exact(2), Leading(2), auxdb_read),
        CommandSpec::new("auxdb_write", Exact(2), Leading(1), auxdb_write),
        CommandSpec::new("save", Exact(2), Leading(2), save),
        CommandSpec::new("load", Exact(3), Leading(3), load),
    ]
}

/// Auxiliary key under which `save` files a variable.
fn saved_key(destination: &str, name: &str) -> String {
    format!("{destination}/{name}")
}

fn aux_get(ctx: &CommandContext<'_>, key: &str) -> Result<Value> {
    match ctx.aux().get(key) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(Error::new(ErrorKind::KeyNotFound(key.to_string()))),
        Err(e) => Err(Error::aux_store(e.to_string())),
    }
}

fn aux_put(ctx: &CommandContext<'_>, key: &str, value: Value) -> Result<()> {
    ctx.aux()
        .put(key, value)
        .map_err(|e| Error::aux_store(e.to_string()))
}

/// `init(node)`: sets this session's node id.
fn init(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let node = ident(&ops[0])?;
    ctx.session_mut().set_node_id(node);
    Ok(Response::Ack)
}

/// `netinit(peer, address)`: records a peer's address.
fn netinit(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let peer = ident(&ops[0])?;
    let address = ident(&ops[1])?;
    ctx.session_mut().add_peer(peer, address);
    Ok(Response::Ack)
}

/// `session(label)`.
fn session(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let label = ident(&ops[0])?;
    ctx.session_mut().set_label(label);
    Ok(Response::Ack)
}

/// `clearvariablestore`: empties the store. Idempotent.
fn clearvariablestore(ctx: &mut CommandContext<'_>, _ops: &[Operand]) -> Result<Response> {
    ctx.session_mut().clear();
    Ok(Response::Ack)
}

/// `auxdb_read(result, key)`.
fn auxdb_read(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let value = aux_get(ctx, &ident(&ops[1])?)?;
    ctx.set(&ops[0], value)
}

/// `auxdb_write(key, source)`.
fn auxdb_write(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let key = ident(&ops[0])?;
    let value = ctx.value(&ops[1])?.into_owned();
    aux_put(ctx, &key, value)?;
    Ok(Response::Ack)
}

/// `save(name, destination)`: files variable `name` under
/// `destination/name`.
fn save(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let name = output_name(&ops[0])?;
    let destination = ident(&ops[1])?;
    let value = ctx.store().get(name)?.clone();
    aux_put(ctx, &saved_key(&destination, name), value)?;
    Ok(Response::Ack)
}

/// `load(result, destination, name)`: the inverse of `save`.
fn load(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let destination = ident(&ops[1])?;
    let name = ident(&ops[2])?;
    let value = aux_get(ctx, &saved_key(&destination, &name))?;
    ctx.set(&ops[0], value)
}
