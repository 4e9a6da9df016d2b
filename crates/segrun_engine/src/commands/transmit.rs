//! Sending values to peers, and pickling values in place.
//!
//! A transmitted value is wrapped in a [`Transfer`] and handed to the
//! executor's transport under its timeout. Sending to the session's own
//! node id binds the value locally and never touches the transport.
//! Nothing already done earlier in the segment is undone when a send fails.

use segrun_foundation::{Arity, Error, Result, Value};
use segrun_store::{pickle_value, unpickle_value};

use super::{CommandContext, ident, output_name};
use crate::executor::Transmission;
use crate::operand::Operand;
use crate::registry::{CommandSpec, Outputs, Response};
use crate::transfer::Transfer;

/// The transmission command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    use Arity::{Exact, Variadic};
    use Outputs::Leading;
    vec![
        CommandSpec::new("transmit", Exact(3), Leading(2), transmit),
        CommandSpec::new("broadcast", Variadic(4), Leading(2), broadcast).unchecked(),
        CommandSpec::new("serialise", Exact(2), Leading(1), serialise),
        CommandSpec::new("deserialise", Exact(2), Leading(1), deserialise),
    ]
}

fn envelope(ctx: &CommandContext<'_>, name: &str, value: &Value) -> Result<Vec<u8>> {
    let session = ctx.session();
    Transfer::new(
        session.label().map(str::to_string),
        session.node_id(),
        name,
        value,
    )?
    .encode()
}

/// `transmit(peer, newname, name)`: sends variable `name` to bind as
/// `newname` on `peer`.
fn transmit(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let peer = ident(&ops[0])?;
    let newname = output_name(&ops[1])?.to_string();
    let value = ctx.value(&ops[2])?.into_owned();

    if peer == ctx.session().node_id() {
        ctx.record_transmission(Transmission {
            peer,
            name: newname,
            result: Ok(()),
        });
        return ctx.set(&ops[1], value);
    }

    let payload = envelope(ctx, &newname, &value)?;
    let dest = ctx.session().destination(&peer);
    let result = ctx.executor().send(dest, payload);
    ctx.record_transmission(Transmission {
        peer: peer.clone(),
        name: newname,
        result: result.clone(),
    });
    result.map_err(|e| Error::transmission(peer, e.to_string()))?;
    Ok(Response::Ack)
}

/// `broadcast(result, newname, name, peers...)`: sends to every peer and
/// writes 1 or 0 per peer to `result`. Individual failures never fail the
/// command.
fn broadcast(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let newname = output_name(&ops[1])?.to_string();
    let value = ctx.value(&ops[2])?.into_owned();
    let peers = ops[3..].iter().map(ident).collect::<Result<Vec<_>>>()?;
    let node_id = ctx.session().node_id().to_string();

    let dests = peers
        .iter()
        .filter(|peer| **peer != node_id)
        .map(|peer| ctx.session().destination(peer))
        .collect::<Vec<_>>();
    let mut remote = if dests.is_empty() {
        Vec::new()
    } else {
        let payload = envelope(ctx, &newname, &value)?;
        ctx.executor().broadcast(dests, payload)
    }
    .into_iter();

    let mut flags = Vec::with_capacity(peers.len());
    let mut local = false;
    for peer in peers {
        let result = if peer == node_id {
            local = true;
            Ok(())
        } else {
            remote.next().unwrap_or_else(|| {
                Err(crate::context::TransportError::Other(
                    "transport returned too few results".to_string(),
                ))
            })
        };
        flags.push(i64::from(result.is_ok()));
        ctx.record_transmission(Transmission {
            peer,
            name: newname.clone(),
            result,
        });
    }

    if local {
        ctx.store_mut().set(newname, value);
    }
    ctx.set(&ops[0], Value::IntegerArray(flags))
}

/// `serialise(result, source)`: the pickled bytes as one row.
fn serialise(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let bytes = pickle_value(&*ctx.value(&ops[1])?)?;
    ctx.set(&ops[0], Value::bytes(&bytes)?)
}

/// `deserialise(result, source)`.
fn deserialise(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let out = unpickle_value(ctx.value(&ops[1])?.single_row()?)?;
    ctx.set(&ops[0], out)
}
