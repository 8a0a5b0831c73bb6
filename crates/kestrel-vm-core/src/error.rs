//! VM error types
//!
//! Inline-cache misses and out-of-range frame slots are not errors. The
//! failures callers are expected to handle all mean the same thing: the
//! compiled representation cannot express a layout or function, and the
//! caller must re-run that unit of code in interpreted mode.

use kestrel_vm_bytecode::BytecodeError;
use thiserror::Error;

/// VM errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// A layout limit was exceeded; fall back to the slow representation
    #[error("ClassLimitError: {0}")]
    ClassLimit(String),

    /// Bytecode error
    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    /// The function can only run interpreted (e.g. it calls `eval`)
    #[error("Unoptimizable: {0}")]
    Unoptimizable(String),
}

impl VmError {
    /// Create a class-limit error
    pub fn class_limit(msg: impl Into<String>) -> Self {
        Self::ClassLimit(msg.into())
    }

    /// Create an unoptimizable-function error
    pub fn unoptimizable(msg: impl Into<String>) -> Self {
        Self::Unoptimizable(msg.into())
    }

    /// Was a layout or binding limit exceeded
    pub fn is_class_limit(&self) -> bool {
        matches!(
            self,
            Self::ClassLimit(_) | Self::Bytecode(BytecodeError::ClassLimit(_))
        )
    }

    /// Does this error ask the caller to retry in interpreted mode
    pub fn requires_interpreter(&self) -> bool {
        self.is_class_limit() || matches!(self, Self::Unoptimizable(_))
    }
}

/// Result type for VM operations
pub type VmResult<T> = std::result::Result<T, VmError>;

/// Run `optimized`, re-running the work through `interpreted` if it hit a
/// class limit or refused the function. `interpreted` is not called when
/// `optimized` succeeds.
pub fn with_interpreter_fallback<T>(
    optimized: impl FnOnce() -> VmResult<T>,
    interpreted: impl FnOnce() -> VmResult<T>,
) -> VmResult<T> {
    match optimized() {
        Err(err) if err.requires_interpreter() => {
            tracing::debug!("falling back to interpreter: {}", err);
            interpreted()
        }
        other => other,
    }
}
