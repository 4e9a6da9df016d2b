//! Segments: ordered programs of command invocations.

use serde::{Deserialize, Serialize};

use segrun_foundation::{Error, Result};

use crate::operand::Operand;

/// Opcode reported for a mux step.
pub const MUX_OPCODE: &str = "mux";

/// One command call: an opcode and its operands, outputs first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// The opcode to dispatch.
    pub opcode: String,
    /// Operands in command order.
    pub operands: Vec<Operand>,
}

impl Invocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(opcode: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            opcode: opcode.into(),
            operands,
        }
    }
}

/// A segment step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// A plain command call.
    Call(Invocation),
    /// Runs `branches[k]`, where `k` is the single integer `selector`
    /// evaluates to. This is the only branching construct.
    Mux {
        /// Selects the branch.
        selector: Operand,
        /// Candidate invocations.
        branches: Vec<Invocation>,
    },
}

impl Step {
    /// The opcode reported for this step.
    #[must_use]
    pub fn opcode(&self) -> &str {
        match self {
            Self::Call(invocation) => &invocation.opcode,
            Self::Mux { .. } => MUX_OPCODE,
        }
    }
}

impl From<Invocation> for Step {
    fn from(invocation: Invocation) -> Self {
        Self::Call(invocation)
    }
}

/// An immutable, ordered program plus optional metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment identifier.
    pub id: Option<String>,
    /// Originating peer.
    pub origin: Option<String>,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

impl Segment {
    /// Creates an empty segment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segment identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the originating peer.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Appends a command call.
    #[must_use]
    pub fn call(mut self, opcode: impl Into<String>, operands: Vec<Operand>) -> Self {
        self.steps.push(Step::Call(Invocation::new(opcode, operands)));
        self
    }

    /// Appends a mux step.
    #[must_use]
    pub fn mux(mut self, selector: Operand, branches: Vec<Invocation>) -> Self {
        self.steps.push(Step::Mux { selector, branches });
        self
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the segment has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Encodes the segment for transfer.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Decodes a segment received from a peer.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` for malformed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::serialization(e.to_string()))
    }
}
