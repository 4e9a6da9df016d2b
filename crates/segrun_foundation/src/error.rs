//! Error types for the segrun engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::typecode::ValueType;

/// The main error type for segrun operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an unknown opcode error.
    #[must_use]
    pub fn unknown_opcode(opcode: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOpcode(opcode.into()))
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: String, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: ValueType) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            actual,
        })
    }

    /// Creates a variable not found error.
    #[must_use]
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::VariableNotFound(name.into()))
    }

    /// Creates an index out of range error.
    #[must_use]
    pub fn index_out_of_range(index: i64, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfRange { index, length })
    }

    /// Creates an invalid key length error.
    #[must_use]
    pub fn invalid_key_length(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::InvalidKeyLength { expected, actual })
    }

    /// Creates a malformed signature error.
    #[must_use]
    pub fn malformed_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedSignature(message.into()))
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput(message.into()))
    }

    /// Creates a length mismatch error.
    #[must_use]
    pub fn length_mismatch(left: usize, right: usize) -> Self {
        Self::new(ErrorKind::LengthMismatch { left, right })
    }

    /// Creates an overflow error for the named operation.
    #[must_use]
    pub fn overflow(operation: &str) -> Self {
        Self::new(ErrorKind::Overflow(operation.to_string()))
    }

    /// Creates a transmission error.
    #[must_use]
    pub fn transmission(peer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransmissionError {
            peer: peer.into(),
            message: message.into(),
        })
    }

    /// Creates an auxiliary store error.
    #[must_use]
    pub fn aux_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuxStoreError(message.into()))
    }

    /// Creates a crypto backend error.
    #[must_use]
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CryptoError(message.into()))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationError(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// No command is registered under the opcode.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),

    /// Wrong number of operands for a command.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Description of expected arity.
        expected: String,
        /// Actual number of operands.
        actual: usize,
    },

    /// A value had the wrong variant or typecode.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Description of what was expected.
        expected: String,
        /// The type encountered.
        actual: ValueType,
    },

    /// A variable name was not present in the store.
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// Index outside the bounds of a container.
    #[error("index out of range: {index} (length {length})")]
    IndexOutOfRange {
        /// The index that was accessed.
        index: i64,
        /// The length of the container.
        length: usize,
    },

    /// Key or IV material of the wrong size.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length in bytes.
        expected: usize,
        /// Supplied length in bytes.
        actual: usize,
    },

    /// A signature that cannot be decoded at all.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Structurally invalid operand data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Text that does not name a typecode.
    #[error("invalid typecode: {0}")]
    InvalidTypeCode(String),

    /// A key absent from a list-map.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A key inserted twice into a list-map.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Two arrays that must agree in length did not.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first operand.
        left: usize,
        /// Length of the second operand.
        right: usize,
    },

    /// Checked integer arithmetic overflowed.
    #[error("integer overflow in {0}")]
    Overflow(String),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A slice with step zero.
    #[error("slice step cannot be zero")]
    ZeroStep,

    /// Transport failure while sending to a peer.
    #[error("transmission to {peer} failed: {message}")]
    TransmissionError {
        /// The peer the payload was addressed to.
        peer: String,
        /// Transport-supplied detail.
        message: String,
    },

    /// Failure reported by the auxiliary store collaborator.
    #[error("auxiliary store error: {0}")]
    AuxStoreError(String),

    /// Failure inside a crypto primitive.
    #[error("crypto error: {0}")]
    CryptoError(String),

    /// Pickle encoding or decoding failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Opcode of the failing command.
    pub opcode: Option<String>,
    /// Step position within the segment.
    pub position: Option<usize>,
    /// Variable involved, if any.
    pub variable: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the opcode.
    #[must_use]
    pub fn with_opcode(mut self, opcode: impl Into<String>) -> Self {
        self.opcode = Some(opcode.into());
        self
    }

    /// Sets the step position.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the variable name.
    #[must_use]
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(opcode) = &self.opcode {
            write!(f, "in {opcode}")?;
        }
        if let Some(position) = self.position {
            write!(f, " at step {position}")?;
        }
        if let Some(variable) = &self.variable {
            write!(f, " ({variable})")?;
        }
        Ok(())
    }
}
