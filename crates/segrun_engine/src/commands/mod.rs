//! The command set.
//!
//! Commands are plain functions with the [`CommandFn`] signature, grouped
//! by family:
//! - [`array`]: construction, indexing, search, sorting, reduction
//! - [`math`]: elementwise operators
//! - [`random`]: session-seeded random arrays
//! - [`listmap`]: list-map construction and queries
//! - [`aggregate`]: node trees and pairs
//! - [`crypto`]: ciphers, digests, signatures
//! - [`session`]: session identity, peers, auxiliary store
//! - [`transmit`]: sending values to peers
//! - [`log`]: observability, never failing
//!
//! Operands are listed outputs first. Every command reads its inputs
//! through a [`CommandContext`], which resolves `Var`s against the store
//! and turns literals into values.
//!
//! [`CommandFn`]: crate::registry::CommandFn

#![allow(clippy::needless_pass_by_value)]

pub mod aggregate;
pub mod array;
pub mod crypto;
pub mod listmap;
pub mod log;
pub mod math;
pub mod random;
pub mod session;
pub mod transmit;

use std::borrow::Cow;

use rand_chacha::ChaCha20Rng;

use segrun_foundation::{Error, Result, TypeCode, Value};
use segrun_store::VariableStore;

use crate::config::EngineConfig;
use crate::context::{AuxStore, LogEvent};
use crate::executor::{Executor, Transmission};
use crate::operand::Operand;
use crate::registry::{RegistryBuilder, Response};
use crate::session::Session;

/// Registers every standard command.
pub fn register_standard(builder: &mut RegistryBuilder) {
    builder.register_all(array::commands());
    builder.register_all(math::commands());
    builder.register_all(random::commands());
    builder.register_all(listmap::commands());
    builder.register_all(aggregate::commands());
    builder.register_all(crypto::commands());
    builder.register_all(session::commands());
    builder.register_all(transmit::commands());
    builder.register_all(log::commands());
}

/// Everything a command may touch while it runs.
pub struct CommandContext<'a> {
    opcode: &'a str,
    session: &'a mut Session,
    executor: &'a Executor,
    transmissions: &'a mut Vec<Transmission>,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        opcode: &'a str,
        session: &'a mut Session,
        executor: &'a Executor,
        transmissions: &'a mut Vec<Transmission>,
    ) -> Self {
        Self {
            opcode,
            session,
            executor,
            transmissions,
        }
    }

    /// The opcode this command was invoked under.
    #[must_use]
    pub fn opcode(&self) -> &str {
        self.opcode
    }

    /// The session's store.
    #[must_use]
    pub fn store(&self) -> &VariableStore {
        self.session.store()
    }

    /// The session's store, mutably.
    pub fn store_mut(&mut self) -> &mut VariableStore {
        self.session.store_mut()
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.session
    }

    /// The session, mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        self.session
    }

    /// The session's random source.
    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        self.session.rng_mut()
    }

    /// The executor's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.executor.config()
    }

    /// The auxiliary store.
    #[must_use]
    pub fn aux(&self) -> &dyn AuxStore {
        self.executor.aux()
    }

    /// Emits a log event, ignoring sink failures.
    pub fn emit(&self, event: &LogEvent) {
        self.executor.emit(event);
    }

    pub(crate) fn executor(&self) -> &Executor {
        self.executor
    }

    pub(crate) fn record_transmission(&mut self, transmission: Transmission) {
        self.transmissions.push(transmission);
    }

    // =========================================================================
    // Operand readers
    // =========================================================================

    /// Resolves an operand to a value.
    ///
    /// # Errors
    ///
    /// Returns `VariableNotFound` for an unbound `Var`, or the literal's
    /// conversion error.
    pub fn value(&self, operand: &Operand) -> Result<Cow<'_, Value>> {
        match operand {
            Operand::Var(name) => self.store().get(name).map(Cow::Borrowed),
            literal => literal.literal_value().map(Cow::Owned),
        }
    }

    /// Looks up the variable an in-place operand names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an operand that cannot name a variable,
    /// or `VariableNotFound`.
    pub fn target(&self, operand: &Operand) -> Result<&Value> {
        self.store().get(output_name(operand)?)
    }

    /// Resolves an operand to a single integer.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` or `InvalidInput` unless the operand is a
    /// one-element `i` array.
    pub fn int(&self, operand: &Operand) -> Result<i64> {
        self.value(operand)?.single_int()
    }

    /// Resolves an operand to a non-negative length.
    ///
    /// # Errors
    ///
    /// As [`int`](Self::int), plus `InvalidInput` for negatives.
    pub fn len(&self, operand: &Operand) -> Result<usize> {
        self.value(operand)?.single_len()
    }

    /// Resolves an operand to a flag: any non-zero integer is true.
    ///
    /// # Errors
    ///
    /// As [`int`](Self::int).
    pub fn flag(&self, operand: &Operand) -> Result<bool> {
        Ok(self.int(operand)? != 0)
    }

    /// Resolves an operand to a single number, widening integers.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` unless the operand is a one-element `i` or
    /// `f` array.
    #[allow(clippy::cast_precision_loss)]
    pub fn number(&self, operand: &Operand) -> Result<f64> {
        let value = self.value(operand)?;
        match &*value {
            Value::IntegerArray(_) => Ok(value.single_int()? as f64),
            other => other.single_float(),
        }
    }

    /// Resolves an operand to text: a `Text` or `Int` literal as written,
    /// or a variable holding one UTF-8 byte row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the bytes are not UTF-8.
    pub fn text(&self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Text(text) => Ok(text.clone()),
            Operand::Int(x) => Ok(x.to_string()),
            other => {
                let value = self.value(other)?;
                String::from_utf8(value.single_row()?.to_vec())
                    .map_err(|e| Error::invalid_input(format!("operand is not UTF-8 text: {e}")))
            }
        }
    }

    /// Parses an operand as a typecode.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTypeCode` for unknown text.
    pub fn typecode(&self, operand: &Operand) -> Result<TypeCode> {
        self.text(operand)?.parse()
    }

    /// Binds `value` to the name an output operand carries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the operand cannot name a variable.
    pub fn set(&mut self, output: &Operand, value: Value) -> Result<Response> {
        let name = output_name(output)?;
        let typecode = value.value_type();
        self.store_mut().set(name, value);
        Ok(Response::Array {
            typecode,
            name: name.to_string(),
        })
    }

    /// Binds several outputs at once.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if the counts differ, or `InvalidInput` for
    /// an operand that cannot name a variable.
    pub fn set_all(&mut self, outputs: &[Operand], values: Vec<Value>) -> Result<Response> {
        if outputs.len() != values.len() {
            return Err(Error::length_mismatch(outputs.len(), values.len()));
        }
        let mut written = Vec::with_capacity(values.len());
        for (output, value) in outputs.iter().zip(values) {
            match self.set(output, value)? {
                Response::Array { typecode, name } => written.push((typecode, name)),
                other => return Err(Error::internal(format!("unexpected response {other}"))),
            }
        }
        Ok(Response::Arrays(written))
    }
}

/// The variable name an output operand carries.
///
/// # Errors
///
/// Returns `InvalidInput` unless the operand is a `Var` or `Text`.
pub fn output_name(operand: &Operand) -> Result<&str> {
    operand
        .as_name()
        .ok_or_else(|| Error::invalid_input(format!("expected a variable name, got {operand}")))
}

/// An identifier written directly in the segment: a peer id, a label, an
/// auxiliary key. `Var` and `Text` give their name as written and `Int`
/// its decimal form; nothing is read from the store.
///
/// # Errors
///
/// Returns `InvalidInput` for other literals.
pub fn ident(operand: &Operand) -> Result<String> {
    match operand {
        Operand::Int(x) => Ok(x.to_string()),
        other => output_name(other).map(str::to_string),
    }
}

/// Wraps positions as an `i` array.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn positions(indices: &[usize]) -> Value {
    Value::IntegerArray(indices.iter().map(|&i| i as i64).collect())
}

/// A one-element `i` array holding a count.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn count(n: usize) -> Value {
    Value::IntegerArray(vec![n as i64])
}

/// A one-element `i` array holding 0 or 1.
pub(crate) fn boolean(flag: bool) -> Value {
    Value::IntegerArray(vec![i64::from(flag)])
}
