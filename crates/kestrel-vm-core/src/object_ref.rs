//! References to heap objects of any kind
//!
//! The object kinds form a closed set, so property access dispatches on an
//! enum tag rather than through a trait object.

use std::sync::Arc;

use crate::activation::ActivationRecord;
use crate::arguments::ArgumentsObject;
use crate::object::JsObject;
use crate::string::PropertyKey;
use crate::value::Value;

/// Reference to a heap object
#[derive(Clone)]
pub enum ObjectRef {
    /// Shaped (or dictionary-mode) ordinary object
    Ordinary(Arc<JsObject>),
    /// Legacy `arguments` object
    Arguments(Arc<ArgumentsObject>),
    /// Activation record reached through name-based scope lookup
    Activation(Arc<ActivationRecord>),
}

impl ObjectRef {
    /// Get property by key
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        match self {
            Self::Ordinary(obj) => obj.get(key),
            Self::Arguments(args) => args.get(key),
            Self::Activation(frame) => frame.get_by_name(key),
        }
    }

    /// Set property by key
    pub fn put(&self, key: PropertyKey, value: Value) {
        match self {
            Self::Ordinary(obj) => obj.put(key, value),
            Self::Arguments(args) => args.put(key, value),
            Self::Activation(frame) => frame.put_by_name(key, value),
        }
    }

    /// Check for an own property
    pub fn has(&self, key: &PropertyKey) -> bool {
        match self {
            Self::Ordinary(obj) => obj.has(key),
            Self::Arguments(args) => args.has(key),
            Self::Activation(frame) => frame.has_by_name(key),
        }
    }

    /// Delete an own property
    pub fn delete(&self, key: &PropertyKey) -> bool {
        match self {
            Self::Ordinary(obj) => obj.delete(key),
            Self::Arguments(args) => args.delete(key),
            Self::Activation(frame) => frame.delete_by_name(key),
        }
    }

    /// Get element by index
    pub fn get_index(&self, index: u32) -> Option<Value> {
        self.get(&PropertyKey::Index(index))
    }

    /// Set element by index
    pub fn put_index(&self, index: u32, value: Value) {
        self.put(PropertyKey::Index(index), value)
    }

    /// Own property keys
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        match self {
            Self::Ordinary(obj) => obj.own_keys(),
            Self::Arguments(args) => args.own_keys(),
            Self::Activation(frame) => frame.own_keys(),
        }
    }

    /// Class name of the object kind
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Ordinary(_) => "Object",
            Self::Arguments(_) => "Arguments",
            Self::Activation(_) => "Call",
        }
    }

    /// The ordinary object, if this is one
    pub fn as_ordinary(&self) -> Option<&Arc<JsObject>> {
        match self {
            Self::Ordinary(obj) => Some(obj),
            _ => None,
        }
    }

    /// The arguments object, if this is one
    pub fn as_arguments(&self) -> Option<&Arc<ArgumentsObject>> {
        match self {
            Self::Arguments(args) => Some(args),
            _ => None,
        }
    }

    /// The activation record, if this is one
    pub fn as_activation(&self) -> Option<&Arc<ActivationRecord>> {
        match self {
            Self::Activation(frame) => Some(frame),
            _ => None,
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ordinary(a), Self::Ordinary(b)) => Arc::ptr_eq(a, b),
            (Self::Arguments(a), Self::Arguments(b)) => Arc::ptr_eq(a, b),
            (Self::Activation(a), Self::Activation(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordinary(obj) => f.debug_tuple("Ordinary").field(obj).finish(),
            Self::Arguments(args) => f.debug_tuple("Arguments").field(args).finish(),
            Self::Activation(frame) => f.debug_tuple("Activation").field(frame).finish(),
        }
    }
}

impl From<Arc<JsObject>> for ObjectRef {
    fn from(obj: Arc<JsObject>) -> Self {
        Self::Ordinary(obj)
    }
}

impl From<Arc<ArgumentsObject>> for ObjectRef {
    fn from(args: Arc<ArgumentsObject>) -> Self {
        Self::Arguments(args)
    }
}

impl From<Arc<ActivationRecord>> for ObjectRef {
    fn from(frame: Arc<ActivationRecord>) -> Self {
        Self::Activation(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Realm;
    use kestrel_vm_bytecode::Function;

    #[test]
    fn test_dispatch_by_kind() {
        let realm = Realm::new();
        let obj = ObjectRef::from(realm.new_object());
        obj.put(PropertyKey::string("x"), Value::int32(1));
        assert_eq!(obj.get(&PropertyKey::string("x")), Some(Value::int32(1)));
        assert_eq!(obj.class_name(), "Object");

        let function = Arc::new(Function::builder().param_name("a").build());
        let frame = realm.activate(function, vec![Value::int32(5)].into());
        let call = ObjectRef::from(frame.clone());
        assert_eq!(call.class_name(), "Call");
        assert_eq!(call.get(&PropertyKey::string("a")), Some(Value::int32(5)));
        call.put(PropertyKey::string("a"), Value::int32(6));
        assert_eq!(frame.get(0), Value::int32(6));

        let args = ObjectRef::from(frame.arguments());
        assert_eq!(args.class_name(), "Arguments");
        assert_eq!(args.get_index(0), Some(Value::int32(6)));
        args.put_index(0, Value::int32(8));
        assert_eq!(frame.get(0), Value::int32(8));
        assert_eq!(args.own_keys(), vec![PropertyKey::Index(0)]);
    }

    #[test]
    fn test_identity_equality() {
        let realm = Realm::new();
        let a = ObjectRef::from(realm.new_object());
        let b = ObjectRef::from(realm.new_object());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(Value::Object(a.clone()), Value::Object(a));
    }
}
