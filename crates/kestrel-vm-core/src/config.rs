//! Layout configuration

/// Limits of the shaped object and compiled-frame representations.
///
/// Exceeding any of them yields [`VmError::ClassLimit`](crate::VmError::ClassLimit).
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Maximum number of shapes a table may intern (default: 1M)
    pub max_shapes: usize,
    /// Maximum number of properties on one shape (default: 1024)
    pub max_shape_properties: usize,
    /// Maximum parameters + locals of a compiled function (default: 65535)
    pub max_bindings: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_shapes: 1 << 20,
            max_shape_properties: 1024,
            max_bindings: u16::MAX as u32,
        }
    }
}
