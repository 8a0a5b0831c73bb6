//! Hidden Classes (Shapes) for property access optimization.
//!
//! A Shape represents the structure of an object: what properties it has
//! and at what offsets they are stored. Shapes are interned in a
//! [`ShapeTable`]: objects that add the same properties in the same order
//! end up with the same `Arc<Shape>`, so an inline cache can compare shapes
//! by pointer.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::config::LayoutConfig;
use crate::error::{VmError, VmResult};
use crate::string::PropertyKey;

/// A Shape defines the layout of properties in an object.
///
/// Shapes are immutable once created.
pub struct Shape {
    /// Identifier, unique within the owning table. The root is 0.
    id: u64,

    /// The parent shape from which this shape was transitioned.
    /// None for the root (empty) shape.
    parent: Option<Arc<Shape>>,

    /// The property key that was added to the parent to create this shape.
    key: Option<PropertyKey>,

    /// Offsets of all properties (inherited + own).
    property_map: FxHashMap<PropertyKey, u32>,

    /// Keys in insertion order; the position of a key is its offset.
    keys_ordered: Vec<PropertyKey>,
}

impl Shape {
    fn root() -> Self {
        Self {
            id: 0,
            parent: None,
            key: None,
            property_map: FxHashMap::default(),
            keys_ordered: Vec::new(),
        }
    }

    /// Extend `self` by `key` at the next free offset.
    fn derive(self: &Arc<Self>, id: u64, key: PropertyKey) -> Self {
        let next_offset = self.keys_ordered.len() as u32;

        let mut property_map = self.property_map.clone();
        property_map.insert(key.clone(), next_offset);

        let mut keys_ordered = Vec::with_capacity(self.keys_ordered.len() + 1);
        keys_ordered.extend(self.keys_ordered.iter().cloned());
        keys_ordered.push(key.clone());

        Self {
            id,
            parent: Some(Arc::clone(self)),
            key: Some(key),
            property_map,
            keys_ordered,
        }
    }

    /// Identifier of this shape within its table
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The shape this one was derived from
    pub fn parent(&self) -> Option<&Arc<Shape>> {
        self.parent.as_ref()
    }

    /// The key added by the transition that produced this shape
    pub fn key(&self) -> Option<&PropertyKey> {
        self.key.as_ref()
    }

    /// Offset of the property added by the transition that produced this shape
    pub fn offset(&self) -> Option<u32> {
        self.key.as_ref().map(|_| self.keys_ordered.len() as u32 - 1)
    }

    /// Get the offset of a property key in this shape.
    #[inline]
    pub fn get_offset(&self, key: &PropertyKey) -> Option<u32> {
        self.property_map.get(key).copied()
    }

    /// All property keys in insertion (offset) order.
    pub fn keys(&self) -> &[PropertyKey] {
        &self.keys_ordered
    }

    /// Number of properties, which is also the number of slots required.
    #[inline]
    pub fn property_count(&self) -> usize {
        self.keys_ordered.len()
    }

    /// Is this the empty root shape
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("offset", &self.offset())
            .field("property_count", &self.property_count())
            .finish()
    }
}

/// Interning table for shapes and their transitions.
///
/// The table is passed around explicitly (usually as `Arc<ShapeTable>` held by
/// a [`Realm`](crate::Realm)); shapes from different tables must not be mixed.
/// Entries are never removed.
pub struct ShapeTable {
    root: Arc<Shape>,
    transitions: DashMap<(u64, PropertyKey), Arc<Shape>, FxBuildHasher>,
    next_id: AtomicU64,
    shape_count: AtomicUsize,
    max_shapes: usize,
    max_shape_properties: usize,
}

impl ShapeTable {
    /// Create a table with default limits
    pub fn new() -> Self {
        Self::with_config(&LayoutConfig::default())
    }

    /// Create a table with the limits from `config`
    pub fn with_config(config: &LayoutConfig) -> Self {
        Self {
            root: Arc::new(Shape::root()),
            transitions: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU64::new(1),
            shape_count: AtomicUsize::new(1),
            max_shapes: config.max_shapes,
            max_shape_properties: config.max_shape_properties,
        }
    }

    /// The empty shape every new object starts with.
    #[inline]
    pub fn root(&self) -> &Arc<Shape> {
        &self.root
    }

    /// Find the transition for adding `key` to `shape`, or create it.
    ///
    /// Repeated calls with the same `(shape, key)` return the same `Arc`.
    /// If `shape` already has `key`, `shape` itself is returned. Fails with
    /// [`VmError::ClassLimit`] if creating the child would exceed the table's
    /// limits.
    pub fn transition(&self, shape: &Arc<Shape>, key: PropertyKey) -> VmResult<Arc<Shape>> {
        if shape.property_map.contains_key(&key) {
            return Ok(Arc::clone(shape));
        }

        let edge = (shape.id, key);
        if let Some(existing) = self.transitions.get(&edge) {
            return Ok(Arc::clone(existing.value()));
        }

        // The shard lock held by the entry makes check-then-insert atomic.
        match self.transitions.entry(edge) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                if shape.property_count() >= self.max_shape_properties {
                    tracing::debug!(
                        "shape {} refused transition: {} properties",
                        shape.id,
                        shape.property_count()
                    );
                    return Err(VmError::class_limit(format!(
                        "shape exceeds {} properties",
                        self.max_shape_properties
                    )));
                }
                // Vacant entries on other shards race for the same budget,
                // so the slot is reserved before the shape is built.
                let reserved = self.shape_count.fetch_update(
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    |count| (count < self.max_shapes).then_some(count + 1),
                );
                if reserved.is_err() {
                    tracing::debug!("shape table full at {} shapes", self.max_shapes);
                    return Err(VmError::class_limit(format!(
                        "shape table exceeds {} shapes",
                        self.max_shapes
                    )));
                }

                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let child = Arc::new(shape.derive(id, entry.key().1.clone()));
                tracing::trace!(
                    "new shape {} = {} + {:?}",
                    id,
                    shape.id,
                    child.key()
                );
                Ok(Arc::clone(entry.insert(child).value()))
            }
        }
    }

    /// Number of shapes interned, including the root
    pub fn shape_count(&self) -> usize {
        self.shape_count.load(Ordering::Acquire)
    }

    /// Number of transition edges recorded
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

impl Default for ShapeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShapeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeTable")
            .field("shape_count", &self.shape_count())
            .field("transition_count", &self.transition_count())
            .finish()
    }
}
