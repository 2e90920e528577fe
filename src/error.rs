//! Typed error kinds raised by the engine modules.
//!
//! Most of these never reach a user: invalid patterns and dropped rows are
//! recovered locally and only logged. `MalformedInput` on import is the one
//! kind that is expected to stop a workflow.

use std::fmt;

use thiserror::Error;

/// A delimited data line whose field count disagreed with the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMismatch {
    /// 1-based position among the non-blank lines of the input (header is line 1).
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for RowMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} has {} field(s), expected {}",
            self.line, self.found, self.expected
        )
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("external call failed: {0}")]
    ExternalCallFailure(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(RowMismatch),
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl EngineError {
    pub fn malformed(message: impl Into<String>) -> Self {
        EngineError::MalformedInput(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        EngineError::ExternalCallFailure(message.into())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
