//! Realm - owner of the shared layout state
//!
//! A realm owns the shape table every object it creates transitions through,
//! the layout limits, and the `Object` constructor referenced by arguments
//! objects. It is `Send + Sync` and can be shared across threads.

use std::sync::Arc;

use kestrel_vm_bytecode::Function;

use crate::activation::ActivationRecord;
use crate::config::LayoutConfig;
use crate::error::{VmError, VmResult};
use crate::inline_cache::FeedbackVector;
use crate::object::JsObject;
use crate::shape::ShapeTable;
use crate::value::Value;

/// Owner of the shape table and layout configuration
pub struct Realm {
    shapes: Arc<ShapeTable>,
    object_constructor: Value,
    config: LayoutConfig,
}

impl Realm {
    /// Create a realm with default configuration
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// Create a realm with custom configuration
    pub fn with_config(config: LayoutConfig) -> Self {
        let object_constructor =
            Value::function(Arc::new(Function::builder().name("Object").build()));
        Self {
            shapes: Arc::new(ShapeTable::with_config(&config)),
            object_constructor,
            config,
        }
    }

    /// The shape table of this realm
    pub fn shapes(&self) -> &Arc<ShapeTable> {
        &self.shapes
    }

    /// The `Object` constructor
    pub fn object_constructor(&self) -> &Value {
        &self.object_constructor
    }

    /// Layout configuration
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Create an empty object
    pub fn new_object(&self) -> Arc<JsObject> {
        Arc::new(JsObject::new(self.shapes.clone()))
    }

    /// Accept `function` for optimized calls.
    ///
    /// Fails if the function calls `eval` or if its bindings cannot be
    /// addressed by frame index; the caller should run it interpreted instead.
    pub fn prepare_function(&self, function: Function) -> VmResult<Arc<Function>> {
        if function.uses_eval() {
            return Err(VmError::unoptimizable(format!(
                "function {} calls eval",
                function.display_name()
            )));
        }
        function.check_binding_limit(self.config.max_bindings)?;
        Ok(Arc::new(function))
    }

    /// Create the activation record for a call
    pub fn activate(&self, function: Arc<Function>, args: Arc<[Value]>) -> Arc<ActivationRecord> {
        Arc::new(ActivationRecord::new(
            self.shapes.clone(),
            function,
            args,
            self.object_constructor.clone(),
        ))
    }

    /// Create the inline caches for the property sites of `function`
    pub fn feedback_vector(&self, function: &Function) -> FeedbackVector {
        FeedbackVector::for_function(function)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("shapes", &self.shapes)
            .field("config", &self.config)
            .finish()
    }
}
