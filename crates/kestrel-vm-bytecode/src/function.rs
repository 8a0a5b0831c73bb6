//! Function metadata
//!
//! The compiler resolves every parameter and local variable of a function to
//! a fixed index. Parameters come first, in declaration order, followed by
//! the locals. The names are kept only for code that cannot be resolved ahead
//! of time (e.g. `eval` code in nested functions).

use serde::{Deserialize, Serialize};

use crate::error::{BytecodeError, BytecodeResult};

/// Function flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFlags {
    /// Does this function call `eval`. Such a function can introduce
    /// bindings at run time, so it never runs with an index-resolved frame.
    pub uses_eval: bool,
}

/// Static metadata of a compiled function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Function name (empty for anonymous)
    pub name: Option<String>,

    /// Function flags
    pub flags: FunctionFlags,

    /// Declared parameter names, by index
    pub param_names: Vec<String>,

    /// Local variable names, indexed from `param_names.len()`
    pub local_names: Vec<String>,

    /// Property name guarded by each inline-cache site, by site index
    pub property_sites: Vec<String>,
}

impl Function {
    /// Create a new function builder
    pub fn builder() -> FunctionBuilder {
        FunctionBuilder::new()
    }

    /// Get the function name or `<anonymous>`
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// Number of declared parameters
    #[inline]
    pub fn param_count(&self) -> u32 {
        self.param_names.len() as u32
    }

    /// Number of declared local variables (excluding parameters)
    #[inline]
    pub fn local_count(&self) -> u32 {
        self.local_names.len() as u32
    }

    /// Number of declared parameters plus local variables
    #[inline]
    pub fn param_and_var_count(&self) -> u32 {
        self.param_count() + self.local_count()
    }

    /// Name of the parameter or local at `index`
    pub fn param_or_var_name(&self, index: u32) -> Option<&str> {
        let index = index as usize;
        let params = self.param_names.len();
        if index < params {
            Some(&self.param_names[index])
        } else {
            self.local_names.get(index - params).map(String::as_str)
        }
    }

    /// Does this function call `eval`
    #[inline]
    pub fn uses_eval(&self) -> bool {
        self.flags.uses_eval
    }

    /// Check that every binding index fits below `max_bindings`.
    ///
    /// Fails with [`BytecodeError::ClassLimit`] otherwise, in which case the
    /// function has to run in interpreted mode.
    pub fn check_binding_limit(&self, max_bindings: u32) -> BytecodeResult<()> {
        let count = self.param_names.len() + self.local_names.len();
        if count > max_bindings as usize {
            return Err(BytecodeError::class_limit(format!(
                "function {} declares {} bindings, limit is {}",
                self.display_name(),
                count,
                max_bindings
            )));
        }
        Ok(())
    }
}

/// Builder for creating functions
#[derive(Debug, Default)]
pub struct FunctionBuilder {
    name: Option<String>,
    flags: FunctionFlags,
    param_names: Vec<String>,
    local_names: Vec<String>,
    property_sites: Vec<String>,
}

impl FunctionBuilder {
    /// Create a new function builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set function name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark as using `eval`
    pub fn uses_eval(mut self, value: bool) -> Self {
        self.flags.uses_eval = value;
        self
    }

    /// Add parameter name
    pub fn param_name(mut self, name: impl Into<String>) -> Self {
        self.param_names.push(name.into());
        self
    }

    /// Add local variable name
    pub fn local_name(mut self, name: impl Into<String>) -> Self {
        self.local_names.push(name.into());
        self
    }

    /// Add an inline-cache site guarding `name`
    pub fn property_site(mut self, name: impl Into<String>) -> Self {
        self.property_sites.push(name.into());
        self
    }

    /// Build the function
    pub fn build(self) -> Function {
        Function {
            name: self.name,
            flags: self.flags,
            param_names: self.param_names,
            local_names: self.local_names,
            property_sites: self.property_sites,
        }
    }
}
