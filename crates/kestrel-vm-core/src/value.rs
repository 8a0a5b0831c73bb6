//! Slot values
//!
//! Slots of objects, frames and arguments objects all hold a [`Value`].
//! Heap values are reference-counted; equality on them is identity.

use std::sync::Arc;

use kestrel_vm_bytecode::Function;

use crate::object_ref::ObjectRef;
use crate::string::JsString;

/// A VM value
#[derive(Clone, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// Small integer
    Int32(i32),
    /// Double
    Number(f64),
    /// Interned string
    String(Arc<JsString>),
    /// Object of any kind
    Object(ObjectRef),
    /// Function
    Function(Arc<Function>),
}

impl Value {
    /// `undefined`
    #[inline]
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// `null`
    #[inline]
    pub const fn null() -> Self {
        Self::Null
    }

    /// Create a boolean
    #[inline]
    pub const fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Create a 32-bit integer
    #[inline]
    pub const fn int32(n: i32) -> Self {
        Self::Int32(n)
    }

    /// Create a double
    #[inline]
    pub const fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// Create an interned string
    pub fn string(s: &str) -> Self {
        Self::String(JsString::intern(s))
    }

    /// Wrap an object reference
    pub fn object(obj: impl Into<ObjectRef>) -> Self {
        Self::Object(obj.into())
    }

    /// Wrap a function
    pub fn function(f: Arc<Function>) -> Self {
        Self::Function(f)
    }

    /// Is `undefined`
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Is `null`
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as i32 if this is an integer
    #[inline]
    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as f64 for any number
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int32(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string, if any
    pub fn as_string(&self) -> Option<&Arc<JsString>> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object reference, if any
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the function, if any
    pub fn as_function(&self) -> Option<&Arc<Function>> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Int32(n) => write!(f, "{}", n),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Object(o) => write!(f, "[object {}]", o.class_name()),
            Self::Function(func) => write!(f, "[function {}]", func.display_name()),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int32(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_equality() {
        assert_eq!(Value::int32(4), Value::from(4));
        assert_ne!(Value::int32(4), Value::number(4.0));
        assert_eq!(Value::string("a"), Value::from("a"));
        assert_eq!(Value::default(), Value::undefined());
        assert_ne!(Value::undefined(), Value::null());
    }

    #[test]
    fn test_function_identity() {
        let f = Arc::new(Function::builder().name("f").build());
        let g = Arc::new(Function::builder().name("f").build());
        assert_eq!(Value::function(f.clone()), Value::function(f.clone()));
        assert_ne!(Value::function(f), Value::function(g));
    }

    #[test]
    fn test_value_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Value>();
    }
}
