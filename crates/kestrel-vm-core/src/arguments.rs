//! Argument storage and the legacy `arguments` object
//!
//! A call frame and its `arguments` object share one [`ArgumentSlots`]. The
//! slots start out borrowing the caller's argument array and take a private
//! copy on the first write, so the caller's array is never modified.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::object::JsObject;
use crate::shape::ShapeTable;
use crate::string::PropertyKey;
use crate::value::Value;

struct SlotState {
    original: Arc<[Value]>,
    copy: Option<Vec<Value>>,
}

impl SlotState {
    #[inline]
    fn values(&self) -> &[Value] {
        self.copy.as_deref().unwrap_or(&self.original)
    }
}

/// Copy-on-write view of the arguments a caller passed
pub struct ArgumentSlots {
    state: RwLock<SlotState>,
}

impl ArgumentSlots {
    /// Share `args` until the first write
    pub fn new(args: Arc<[Value]>) -> Self {
        Self {
            state: RwLock::new(SlotState {
                original: args,
                copy: None,
            }),
        }
    }

    /// Number of arguments supplied
    pub fn len(&self) -> usize {
        self.state.read().original.len()
    }

    /// Check if no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read argument `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.state.read().values().get(index).cloned()
    }

    /// Write argument `index`, copying the caller's array first if it is
    /// still shared. Returns `false` if `index` is out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut guard = self.state.write();
        let state = &mut *guard;
        if index >= state.original.len() {
            return false;
        }
        let copy = state.copy.get_or_insert_with(|| {
            tracing::trace!("copying {} arguments on write", state.original.len());
            state.original.to_vec()
        });
        copy[index] = value;
        true
    }

    /// Is the caller's array still shared (no write happened yet)
    pub fn is_shared(&self) -> bool {
        self.state.read().copy.is_none()
    }

    /// Current argument values
    pub fn to_vec(&self) -> Vec<Value> {
        self.state.read().values().to_vec()
    }
}

impl std::fmt::Debug for ArgumentSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentSlots")
            .field("len", &self.len())
            .field("shared", &self.is_shared())
            .finish()
    }
}

/// Property descriptor of an own data property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// The value
    pub value: Value,
    /// Writable
    pub writable: bool,
    /// Enumerable
    pub enumerable: bool,
    /// Configurable
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property
    pub fn data(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }
}

/// The array-like `arguments` object of a call
///
/// Indices below the argument count read and write the shared argument slots
/// unless deleted. Everything else, including deleted indices, lives in an
/// ordinary object.
pub struct ArgumentsObject {
    args: Arc<ArgumentSlots>,
    length: Value,
    callee: Value,
    constructor: Value,
    deleted: OnceLock<Box<[AtomicBool]>>,
    properties: JsObject,
}

impl ArgumentsObject {
    pub(crate) fn new(
        shapes: Arc<ShapeTable>,
        args: Arc<ArgumentSlots>,
        callee: Value,
        constructor: Value,
    ) -> Self {
        Self {
            length: Value::int32(args.len() as i32),
            args,
            callee,
            constructor,
            deleted: OnceLock::new(),
            properties: JsObject::new(shapes),
        }
    }

    fn has_arg(&self, index: u32) -> bool {
        let index = index as usize;
        index < self.args.len()
            && self
                .deleted
                .get()
                .is_none_or(|deleted| !deleted[index].load(Ordering::Acquire))
    }

    /// Read element `index`
    pub fn get_index(&self, index: u32) -> Option<Value> {
        if self.has_arg(index) {
            self.args.get(index as usize)
        } else {
            self.properties.get(&PropertyKey::Index(index))
        }
    }

    /// Write element `index`
    pub fn put_index(&self, index: u32, value: Value) {
        if self.has_arg(index) {
            self.args.set(index as usize, value);
        } else {
            self.properties.put(PropertyKey::Index(index), value);
        }
    }

    /// Check for element `index`
    pub fn has_index(&self, index: u32) -> bool {
        self.has_arg(index) || self.properties.has(&PropertyKey::Index(index))
    }

    /// Delete element `index`. An argument index stops mirroring the
    /// argument slot for good.
    pub fn delete_index(&self, index: u32) -> bool {
        if (index as usize) < self.args.len() {
            let deleted = self.deleted.get_or_init(|| {
                (0..self.args.len())
                    .map(|_| AtomicBool::new(false))
                    .collect()
            });
            deleted[index as usize].store(true, Ordering::Release);
        }
        self.properties.delete(&PropertyKey::Index(index));
        true
    }

    /// Read a named property. `length`, `callee` and `constructor` are
    /// served from the call unless they were overwritten.
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        if let PropertyKey::Index(index) = key {
            return self.get_index(*index);
        }
        self.properties.get(key).or_else(|| self.builtin(key))
    }

    /// Write a named property
    pub fn put(&self, key: PropertyKey, value: Value) {
        match key {
            PropertyKey::Index(index) => self.put_index(index, value),
            key => self.properties.put(key, value),
        }
    }

    /// Check for a named property
    pub fn has(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => self.has_index(*index),
            key => self.properties.has(key) || self.builtin(key).is_some(),
        }
    }

    /// Delete a named property
    pub fn delete(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => self.delete_index(*index),
            key => {
                self.properties.delete(key);
                true
            }
        }
    }

    /// Descriptor for element `index` while it still mirrors an argument
    pub fn own_property_descriptor(&self, index: u32) -> Option<PropertyDescriptor> {
        let key = PropertyKey::Index(index);
        if !self.has_arg(index) || self.properties.has(&key) {
            return self.properties.get(&key).map(PropertyDescriptor::data);
        }
        self.args.get(index as usize).map(PropertyDescriptor::data)
    }

    /// Own enumerable keys: the argument indices
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        (0..self.args.len() as u32).map(PropertyKey::Index).collect()
    }

    /// Number of arguments supplied by the caller
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if the caller supplied no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn builtin(&self, key: &PropertyKey) -> Option<Value> {
        match key.as_str()? {
            "length" => Some(self.length.clone()),
            "callee" => Some(self.callee.clone()),
            "constructor" => Some(self.constructor.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ArgumentsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentsObject")
            .field("args", &self.args)
            .field("properties", &self.properties)
            .finish()
    }
}
