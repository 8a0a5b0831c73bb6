//! # Kestrel VM Core
//!
//! Property-access fast paths for the Kestrel VM.
//!
//! ## Design Principles
//!
//! - **Hidden classes**: objects that gain the same properties in the same
//!   order share one interned [`Shape`]
//! - **Inline caches**: each property site remembers one (shape, slot) pair
//!   and reads the slot directly while the shape matches
//! - **Indexed frames**: parameters and locals live in fixed slots of an
//!   [`ActivationRecord`]; name lookup is only a fallback
//! - **Thread-safe**: all types are `Send + Sync`; lazily built state is
//!   published exactly once

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod activation;
pub mod arguments;
pub mod config;
pub mod error;
pub mod inline_cache;
pub mod object;
pub mod object_ref;
pub mod realm;
pub mod shape;
pub mod string;
pub mod value;

pub use activation::{ARGUMENTS_ID, ActivationRecord};
pub use arguments::{ArgumentSlots, ArgumentsObject, PropertyDescriptor};
pub use config::LayoutConfig;
pub use error::{VmError, VmResult, with_interpreter_fallback};
pub use inline_cache::{FeedbackVector, InlineCache, InlineCacheState};
pub use object::{JsObject, PropertyLookup};
pub use object_ref::ObjectRef;
pub use realm::Realm;
pub use shape::{Shape, ShapeTable};
pub use string::{JsString, PropertyKey};
pub use value::Value;

pub use kestrel_vm_bytecode::Function;
