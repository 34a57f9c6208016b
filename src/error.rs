//! Typed errors for every stage of the driver
//!
//! Two tiers: `JitError` from backend initialization is fatal for the
//! session, everything wrapped in `SessionError` is unit-level and the
//! interactive loop reports it and moves on.

use thiserror::Error;

use crate::jit::JitError;
use crate::reader::SourceLoc;

/// Tokenizer or parser failure for one unit
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error at {loc}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub loc: SourceLoc,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, loc: SourceLoc) -> Self {
        SyntaxError {
            message: message.into(),
            loc,
        }
    }
}

/// Failure to lower a unit against the current symbol table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("unknown variable name '{name}'")]
    UnknownVariable { name: String },

    #[error("unknown function referenced: '{name}'")]
    UnknownFunction { name: String },

    #[error("incorrect number of arguments passed to '{name}': expected {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("'{name}' is declared with {declared} parameter(s), cannot redefine it with {found}")]
    ConflictingSignature {
        name: String,
        declared: usize,
        found: usize,
    },

    #[error("duplicate parameter '{param}' in '{name}'")]
    DuplicateParameter { name: String, param: String },

    #[error("invalid binary operator '{op}'")]
    UnknownOperator { op: char },
}

/// Recoverable failure of a single top-level unit
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Lower(#[from] LowerError),

    #[error(transparent)]
    Jit(#[from] JitError),
}

/// Crate-level error used by the binary
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("backend initialization failed: {0}")]
    Backend(JitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
