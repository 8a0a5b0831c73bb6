//! Bytecode error types

use thiserror::Error;

/// Errors raised while preparing compiled code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    /// The function exceeds a limit of the compiled representation.
    ///
    /// Recoverable: the caller is expected to run the function in
    /// interpreted mode instead.
    #[error("class limit exceeded: {0}")]
    ClassLimit(String),
}

impl BytecodeError {
    /// Create a class-limit error
    pub fn class_limit(msg: impl Into<String>) -> Self {
        Self::ClassLimit(msg.into())
    }
}

/// Result type for bytecode operations
pub type BytecodeResult<T> = std::result::Result<T, BytecodeError>;
