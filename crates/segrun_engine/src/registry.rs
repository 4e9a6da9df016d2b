//! The opcode table.
//!
//! A [`CommandRegistry`] maps opcode strings to [`CommandSpec`]s. It is
//! built once through [`RegistryBuilder`] and read-only afterwards, so one
//! registry can be shared by every executor and session in a process
//! behind an `Arc`.

use std::collections::HashMap;
use std::fmt;

use segrun_foundation::{Arity, Error, Result, ValueType};
use segrun_store::VariableStore;

use crate::commands::{self, CommandContext};
use crate::operand::Operand;

/// Signature shared by every command implementation.
pub type CommandFn = fn(&mut CommandContext<'_>, &[Operand]) -> Result<Response>;

// =============================================================================
// Response
// =============================================================================

/// What a command reports back, collected by the executor in step order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Completed with nothing to report.
    Ack,
    /// Wrote one variable.
    Array {
        /// Type of the written value.
        typecode: ValueType,
        /// Variable name.
        name: String,
    },
    /// Wrote several variables.
    Arrays(Vec<(ValueType, String)>),
    /// Rendered text.
    Text(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack => write!(f, "ok"),
            Self::Array { typecode, name } => write!(f, "array {typecode} {name}"),
            Self::Arrays(items) => {
                for (i, (typecode, name)) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "array {typecode} {name}")?;
                }
                Ok(())
            }
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

// =============================================================================
// Command Spec
// =============================================================================

/// Which operands name outputs. Output operands, and identifiers such as
/// peer ids that share their leading positions, are not required to exist
/// in the store before the command runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outputs {
    /// No outputs; every `Var` operand is an input.
    None,
    /// The first N operands.
    Leading(usize),
    /// Every operand except the last N.
    AllBut(usize),
}

impl Outputs {
    /// Number of leading output operands among `count`.
    #[must_use]
    pub const fn count(self, count: usize) -> usize {
        match self {
            Self::None => 0,
            Self::Leading(n) => {
                if n < count {
                    n
                } else {
                    count
                }
            }
            Self::AllBut(n) => count.saturating_sub(n),
        }
    }
}

/// A registered command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Canonical opcode.
    pub name: &'static str,
    /// Extra opcodes that dispatch to the same command.
    pub aliases: &'static [&'static str],
    /// Accepted operand counts.
    pub arity: Arity,
    /// Output positions.
    pub outputs: Outputs,
    /// Whether `Var` inputs must exist before the command runs.
    pub checks_inputs: bool,
    /// The implementation.
    pub run: CommandFn,
}

impl CommandSpec {
    /// Creates a spec whose `Var` inputs are checked.
    #[must_use]
    pub const fn new(name: &'static str, arity: Arity, outputs: Outputs, run: CommandFn) -> Self {
        Self {
            name,
            aliases: &[],
            arity,
            outputs,
            checks_inputs: true,
            run,
        }
    }

    /// Registers the command under additional opcodes.
    #[must_use]
    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Skips the input existence check. Used by commands that must never
    /// fail validation.
    #[must_use]
    pub const fn unchecked(mut self) -> Self {
        self.checks_inputs = false;
        self
    }

    /// Checks the operand count.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the count is not accepted.
    pub fn check_arity(&self, count: usize) -> Result<()> {
        if self.arity.accepts(count) {
            Ok(())
        } else {
            Err(Error::arity_mismatch(self.arity.to_string(), count))
        }
    }

    /// Checks that every `Var` in an input position is bound.
    ///
    /// # Errors
    ///
    /// Returns `VariableNotFound` for the first unbound input.
    pub fn check_inputs(&self, operands: &[Operand], store: &VariableStore) -> Result<()> {
        if !self.checks_inputs {
            return Ok(());
        }
        let skip = self.outputs.count(operands.len());
        match operands[skip..]
            .iter()
            .filter_map(Operand::as_var)
            .find(|name| !store.contains(name))
        {
            Some(name) => Err(Error::variable_not_found(name)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arity", &self.arity)
            .field("outputs", &self.outputs)
            .field("checks_inputs", &self.checks_inputs)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Collects command specs before freezing them into a [`CommandRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: HashMap<&'static str, CommandSpec>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under its name and aliases, replacing any
    /// earlier registration of those opcodes.
    pub fn register(&mut self, spec: CommandSpec) {
        for &alias in spec.aliases {
            self.commands.insert(alias, spec);
        }
        self.commands.insert(spec.name, spec);
    }

    /// Registers several commands.
    pub fn register_all(&mut self, specs: impl IntoIterator<Item = CommandSpec>) {
        for spec in specs {
            self.register(spec);
        }
    }

    /// Freezes the table.
    #[must_use]
    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
        }
    }
}

/// Immutable opcode table.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The full command set.
    #[must_use]
    pub fn standard() -> Self {
        let mut builder = RegistryBuilder::new();
        commands::register_standard(&mut builder);
        builder.build()
    }

    /// Looks up an opcode.
    #[must_use]
    pub fn get(&self, opcode: &str) -> Option<&CommandSpec> {
        self.commands.get(opcode)
    }

    /// Looks up an opcode and checks the operand count.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOpcode` or `ArityMismatch`.
    pub fn resolve(&self, opcode: &str, operands: usize) -> Result<&CommandSpec> {
        let spec = self
            .get(opcode)
            .ok_or_else(|| Error::unknown_opcode(opcode))?;
        spec.check_arity(operands)?;
        Ok(spec)
    }

    /// Checks if an opcode is registered.
    #[must_use]
    pub fn contains(&self, opcode: &str) -> bool {
        self.commands.contains_key(opcode)
    }

    /// All registered opcodes, aliases included, sorted.
    #[must_use]
    pub fn opcodes(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered opcodes, aliases included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
