//! Activation records for optimized calls
//!
//! Parameters and locals of a compiled function are addressed by the index
//! the compiler assigned them, never by name. The index space of a frame is:
//!
//! ```text
//! [0, locals_start)                    arguments supplied by the caller
//! [locals_start, param_and_var_count)  locals, including missing parameters
//! ARGUMENTS_ID                         the `arguments` binding
//! ```
//!
//! where `locals_start = min(supplied, declared params)`. Declared parameters
//! the caller did not supply are plain locals: they are reachable by name but
//! not through the `arguments` object.
//!
//! Name-based access exists only for code that could not be index-resolved
//! ahead of time (e.g. `eval` code in a nested function).

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::{Arc, OnceLock};

use kestrel_vm_bytecode::Function;

use crate::arguments::{ArgumentSlots, ArgumentsObject};
use crate::object::JsObject;
use crate::shape::ShapeTable;
use crate::string::PropertyKey;
use crate::value::Value;

/// Frame index of the `arguments` binding
pub const ARGUMENTS_ID: u32 = u32::MAX;

#[derive(Clone)]
enum LocalSlot {
    Var(Value),
    Const(Value),
}

impl LocalSlot {
    #[inline]
    fn value(&self) -> &Value {
        match self {
            Self::Var(v) | Self::Const(v) => v,
        }
    }
}

/// Per-call storage for a compiled function's parameters and locals
pub struct ActivationRecord {
    function: Arc<Function>,
    shapes: Arc<ShapeTable>,
    object_constructor: Value,
    args: Arc<ArgumentSlots>,
    locals: RwLock<SmallVec<[LocalSlot; 8]>>,
    locals_start: u32,
    param_and_var_count: u32,
    arguments: OnceLock<Arc<ArgumentsObject>>,
    /// Set when compiled code assigns to `arguments` itself
    arguments_binding: RwLock<Option<Value>>,
    property_map: OnceLock<FxHashMap<PropertyKey, u32>>,
    properties: JsObject,
    parent: RwLock<Option<Arc<ActivationRecord>>>,
}

impl ActivationRecord {
    /// Create the frame for a call of `function` with `args`.
    ///
    /// `args` is shared with the caller until the frame writes a parameter.
    pub fn new(
        shapes: Arc<ShapeTable>,
        function: Arc<Function>,
        args: Arc<[Value]>,
        object_constructor: Value,
    ) -> Self {
        let param_and_var_count = function.param_and_var_count();
        let locals_start = (args.len() as u32).min(function.param_count());
        let locals: SmallVec<[LocalSlot; 8]> = (locals_start..param_and_var_count)
            .map(|_| LocalSlot::Var(Value::undefined()))
            .collect();

        Self {
            properties: JsObject::new(shapes.clone()),
            shapes,
            object_constructor,
            args: Arc::new(ArgumentSlots::new(args)),
            locals: RwLock::new(locals),
            locals_start,
            param_and_var_count,
            arguments: OnceLock::new(),
            arguments_binding: RwLock::new(None),
            property_map: OnceLock::new(),
            function,
            parent: RwLock::new(None),
        }
    }

    /// The function this frame belongs to
    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }

    /// Index of the first local slot
    #[inline]
    pub fn locals_start(&self) -> u32 {
        self.locals_start
    }

    /// Number of declared parameters plus locals
    #[inline]
    pub fn param_and_var_count(&self) -> u32 {
        self.param_and_var_count
    }

    /// Read the parameter or local at `index`.
    ///
    /// Indices outside the frame read as `undefined`.
    pub fn get(&self, index: u32) -> Value {
        if index < self.locals_start {
            self.args.get(index as usize).unwrap_or_default()
        } else if index < self.param_and_var_count {
            self.locals.read()[(index - self.locals_start) as usize]
                .value()
                .clone()
        } else if index == ARGUMENTS_ID {
            self.arguments_value()
        } else {
            Value::undefined()
        }
    }

    /// Write the parameter or local at `index`.
    ///
    /// Writes to constants and to indices outside the frame are ignored.
    pub fn set(&self, index: u32, value: Value) {
        if index < self.locals_start {
            self.args.set(index as usize, value);
        } else if index < self.param_and_var_count {
            let mut locals = self.locals.write();
            let slot = &mut locals[(index - self.locals_start) as usize];
            if let LocalSlot::Var(current) = slot {
                *current = value;
            }
        } else if index == ARGUMENTS_ID {
            *self.arguments_binding.write() = Some(value);
        } else {
            tracing::trace!("ignoring write to frame index {}", index);
        }
    }

    /// Bind the local at `index` to `value` for the rest of the call.
    ///
    /// A slot that is already constant keeps its first value.
    pub fn set_const(&self, index: u32, value: Value) {
        if index < self.locals_start || index >= self.param_and_var_count {
            tracing::trace!("ignoring const binding of frame index {}", index);
            return;
        }
        let mut locals = self.locals.write();
        let slot = &mut locals[(index - self.locals_start) as usize];
        if matches!(slot, LocalSlot::Const(_)) {
            tracing::trace!("ignoring rebinding of const frame index {}", index);
            return;
        }
        *slot = LocalSlot::Const(value);
    }

    /// Is the local at `index` a constant
    pub fn is_const(&self, index: u32) -> bool {
        index >= self.locals_start
            && index < self.param_and_var_count
            && matches!(
                self.locals.read()[(index - self.locals_start) as usize],
                LocalSlot::Const(_)
            )
    }

    /// The `arguments` object of this call, created on first use.
    ///
    /// Every call returns the same instance.
    pub fn arguments(&self) -> Arc<ArgumentsObject> {
        Arc::clone(self.arguments.get_or_init(|| {
            tracing::trace!("materializing arguments for {}", self.function.display_name());
            Arc::new(ArgumentsObject::new(
                self.shapes.clone(),
                self.args.clone(),
                Value::function(self.function.clone()),
                self.object_constructor.clone(),
            ))
        }))
    }

    /// What `arguments` currently resolves to in this frame
    pub fn arguments_value(&self) -> Value {
        if let Some(value) = &*self.arguments_binding.read() {
            return value.clone();
        }
        Value::object(self.arguments())
    }

    /// Has the caller's argument array been copied
    pub fn has_copied_arguments(&self) -> bool {
        !self.args.is_shared()
    }

    /// Read a binding by name, falling back to the frame's own properties.
    pub fn get_by_name(&self, key: &PropertyKey) -> Option<Value> {
        match self.property_map().get(key) {
            Some(&index) => Some(self.get(index)),
            None => self.properties.get(key),
        }
    }

    /// Write a binding by name, falling back to the frame's own properties.
    pub fn put_by_name(&self, key: PropertyKey, value: Value) {
        match self.property_map().get(&key) {
            Some(&index) => self.set(index, value),
            None => self.properties.put(key, value),
        }
    }

    /// Check for a binding by name
    pub fn has_by_name(&self, key: &PropertyKey) -> bool {
        self.property_map().contains_key(key) || self.properties.has(key)
    }

    /// Delete a property added by name. Bindings cannot be deleted.
    pub fn delete_by_name(&self, key: &PropertyKey) -> bool {
        if self.property_map().contains_key(key) {
            return false;
        }
        self.properties.delete(key)
    }

    /// Binding names followed by properties added by name
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<(u32, PropertyKey)> = self
            .property_map()
            .iter()
            .map(|(key, &index)| (index, key.clone()))
            .collect();
        keys.sort_by_key(|(index, _)| *index);
        keys.into_iter()
            .map(|(_, key)| key)
            .chain(self.properties.own_keys())
            .collect()
    }

    /// Link the activation of the lexically enclosing call
    pub fn set_parent_activation(&self, parent: Arc<ActivationRecord>) {
        *self.parent.write() = Some(parent);
    }

    /// The activation of the lexically enclosing call
    pub fn parent_activation(&self) -> Option<Arc<ActivationRecord>> {
        self.parent.read().clone()
    }

    fn property_map(&self) -> &FxHashMap<PropertyKey, u32> {
        self.property_map.get_or_init(|| {
            let function = &self.function;
            let params = function.param_count();
            let mut map = FxHashMap::default();
            for index in 0..params {
                if let Some(name) = function.param_or_var_name(index) {
                    map.insert(PropertyKey::string(name), index);
                }
            }
            // A parameter named `arguments` shadows the arguments object.
            map.entry(PropertyKey::string("arguments"))
                .or_insert(ARGUMENTS_ID);
            for index in params..self.param_and_var_count {
                if let Some(name) = function.param_or_var_name(index) {
                    map.insert(PropertyKey::string(name), index);
                }
            }
            map
        })
    }
}

impl std::fmt::Debug for ActivationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationRecord")
            .field("function", &self.function.display_name())
            .field("locals_start", &self.locals_start)
            .field("param_and_var_count", &self.param_and_var_count)
            .field("args", &self.args)
            .finish()
    }
}
