//! # Kestrel VM Bytecode
//!
//! Static function metadata produced by the compiler and consumed by the VM:
//! declared parameter and local names (index-resolved at compile time),
//! function flags, and the property names guarded by each inline-cache site.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod function;

pub use error::{BytecodeError, BytecodeResult};
pub use function::{Function, FunctionBuilder, FunctionFlags};
