//! Observability commands. These never fail and never change the store.

use segrun_foundation::{Arity, Result};

use super::CommandContext;
use crate::context::LogEvent;
use crate::operand::Operand;
use crate::registry::{CommandFn, CommandSpec, Outputs, Response};

/// The logging command family.
#[must_use]
pub fn commands() -> Vec<CommandSpec> {
    let spec = |name: &'static str, run: CommandFn| {
        CommandSpec::new(name, Arity::Variadic(0), Outputs::None, run).unchecked()
    };
    vec![
        spec("logmessage", logmessage),
        spec("logvariable", logvariable),
        spec("logstats", logstats),
    ]
}

/// `logmessage(text...)`: operands joined by spaces. An operand that does
/// not read as text is shown as written.
fn logmessage(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    let text = ops
        .iter()
        .map(|op| ctx.text(op).unwrap_or_else(|_| op.to_string()))
        .collect::<Vec<_>>()
        .join(" ");
    ctx.emit(&LogEvent::Message(text));
    Ok(Response::Ack)
}

/// `logvariable(names...)`: one event per name, bound or not.
fn logvariable(ctx: &mut CommandContext<'_>, ops: &[Operand]) -> Result<Response> {
    for op in ops {
        let name = op.as_name().map_or_else(|| op.to_string(), str::to_string);
        let value = ctx.store().get(&name).ok().cloned();
        ctx.emit(&LogEvent::Variable { name, value });
    }
    Ok(Response::Ack)
}

/// `logstats`: the store's counters.
fn logstats(ctx: &mut CommandContext<'_>, _ops: &[Operand]) -> Result<Response> {
    ctx.emit(&LogEvent::Stats(ctx.store().stats()));
    Ok(Response::Ack)
}
