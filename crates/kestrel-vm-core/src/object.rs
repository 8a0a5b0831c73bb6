//! Objects with hidden classes (shapes)
//!
//! A shaped object stores its property values in a slot vector laid out by
//! its current [`Shape`]. The shape and the slots live behind one lock, so a
//! reader can never observe a shape that points past the end of the slots.
//!
//! Deleting a property, or running into a shape-table limit, moves the object
//! into dictionary mode: an insertion-ordered hash map with no shape. Inline
//! caches never bind to dictionary-mode objects.

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

use crate::shape::{Shape, ShapeTable};
use crate::string::PropertyKey;
use crate::value::Value;

type Dictionary = IndexMap<PropertyKey, Value, FxBuildHasher>;

enum PropertyStorage {
    Shaped { shape: Arc<Shape>, slots: Vec<Value> },
    Dictionary(Dictionary),
}

/// Result of [`JsObject::extended_get`]: everything an inline cache needs to
/// bind itself after one lookup.
#[derive(Debug, Clone)]
pub struct PropertyLookup {
    /// Shape of the object at lookup time (`None` in dictionary mode)
    pub shape: Option<Arc<Shape>>,
    /// Slot of the property (`None` if absent or in dictionary mode)
    pub offset: Option<u32>,
    /// The property value (`None` if absent)
    pub value: Option<Value>,
}

/// An object store
///
/// Thread-safe with interior mutability.
pub struct JsObject {
    shapes: Arc<ShapeTable>,
    storage: RwLock<PropertyStorage>,
}

impl JsObject {
    /// Create a new empty object with the table's root shape
    pub fn new(shapes: Arc<ShapeTable>) -> Self {
        let root = Arc::clone(shapes.root());
        Self {
            shapes,
            storage: RwLock::new(PropertyStorage::Shaped {
                shape: root,
                slots: Vec::new(),
            }),
        }
    }

    /// Current shape, or `None` in dictionary mode
    pub fn shape(&self) -> Option<Arc<Shape>> {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, .. } => Some(Arc::clone(shape)),
            PropertyStorage::Dictionary(_) => None,
        }
    }

    /// Is this object in dictionary mode
    pub fn is_dictionary_mode(&self) -> bool {
        matches!(&*self.storage.read(), PropertyStorage::Dictionary(_))
    }

    /// Get property by key. Returns `None` if absent.
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, slots } => shape
                .get_offset(key)
                .map(|offset| slots[offset as usize].clone()),
            PropertyStorage::Dictionary(map) => map.get(key).cloned(),
        }
    }

    /// Check if object has own property
    pub fn has(&self, key: &PropertyKey) -> bool {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, .. } => shape.get_offset(key).is_some(),
            PropertyStorage::Dictionary(map) => map.contains_key(key),
        }
    }

    /// Look up `key` and report the shape and slot it was found at.
    pub fn extended_get(&self, key: &PropertyKey) -> PropertyLookup {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, slots } => {
                let offset = shape.get_offset(key);
                PropertyLookup {
                    shape: Some(Arc::clone(shape)),
                    offset,
                    value: offset.map(|o| slots[o as usize].clone()),
                }
            }
            PropertyStorage::Dictionary(map) => PropertyLookup {
                shape: None,
                offset: None,
                value: map.get(key).cloned(),
            },
        }
    }

    /// Read the slot at `offset` without checking the shape.
    ///
    /// The caller must already have checked that the object's shape maps a
    /// property to `offset`, under the same lock as the read if the object
    /// can change concurrently. Panics if the object has no such slot.
    /// Dictionary-mode objects have no slots and read as `undefined`.
    #[inline]
    pub fn get_value_at_offset(&self, offset: u32) -> Value {
        match &*self.storage.read() {
            PropertyStorage::Shaped { slots, .. } => slots[offset as usize].clone(),
            PropertyStorage::Dictionary(_) => Value::undefined(),
        }
    }

    /// Set property by key, adding it if absent.
    pub fn put(&self, key: PropertyKey, value: Value) {
        self.put_located(key, value);
    }

    /// Set property by key and return where it was stored, if the object is
    /// still shaped afterwards.
    pub(crate) fn put_located(&self, key: PropertyKey, value: Value) -> Option<(Arc<Shape>, u32)> {
        let mut storage = self.storage.write();
        match &mut *storage {
            PropertyStorage::Shaped { shape, slots } => {
                if let Some(offset) = shape.get_offset(&key) {
                    slots[offset as usize] = value;
                    return Some((Arc::clone(shape), offset));
                }
                match self.shapes.transition(shape, key.clone()) {
                    Ok(next) => {
                        let offset = next.property_count() as u32 - 1;
                        // Grow before publishing the new shape; both happen
                        // under the write lock.
                        slots.resize(next.property_count(), Value::undefined());
                        slots[offset as usize] = value;
                        *shape = Arc::clone(&next);
                        Some((next, offset))
                    }
                    Err(err) => {
                        tracing::debug!("object switching to dictionary mode: {}", err);
                        let mut map = Self::dictionary_from(shape, slots);
                        map.insert(key, value);
                        *storage = PropertyStorage::Dictionary(map);
                        None
                    }
                }
            }
            PropertyStorage::Dictionary(map) => {
                map.insert(key, value);
                None
            }
        }
    }

    /// Delete own property. Returns `true` if it existed.
    ///
    /// Shapes cannot express removal, so a shaped object first converts to
    /// dictionary mode.
    pub fn delete(&self, key: &PropertyKey) -> bool {
        let mut storage = self.storage.write();
        match &mut *storage {
            PropertyStorage::Shaped { shape, slots } => {
                if shape.get_offset(key).is_none() {
                    return false;
                }
                tracing::debug!("object switching to dictionary mode: delete {}", key);
                let mut map = Self::dictionary_from(shape, slots);
                map.shift_remove(key);
                *storage = PropertyStorage::Dictionary(map);
                true
            }
            PropertyStorage::Dictionary(map) => map.shift_remove(key).is_some(),
        }
    }

    /// Get own property keys in insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, .. } => shape.keys().to_vec(),
            PropertyStorage::Dictionary(map) => map.keys().cloned().collect(),
        }
    }

    /// Number of own properties
    pub fn property_count(&self) -> usize {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, .. } => shape.property_count(),
            PropertyStorage::Dictionary(map) => map.len(),
        }
    }

    /// Read slot `offset` if the object still has `expected` as its shape.
    ///
    /// Check and read happen under one read lock.
    #[inline]
    pub(crate) fn read_cached(&self, expected: &Arc<Shape>, offset: u32) -> Option<Value> {
        match &*self.storage.read() {
            PropertyStorage::Shaped { shape, slots } if Arc::ptr_eq(shape, expected) => {
                Some(slots[offset as usize].clone())
            }
            _ => None,
        }
    }

    /// Write slot `offset` if the object still has `expected` as its shape.
    /// Gives the value back on a shape mismatch.
    #[inline]
    pub(crate) fn write_cached(
        &self,
        expected: &Arc<Shape>,
        offset: u32,
        value: Value,
    ) -> Result<(), Value> {
        let mut storage = self.storage.write();
        if let PropertyStorage::Shaped { shape, slots } = &mut *storage
            && Arc::ptr_eq(shape, expected)
        {
            slots[offset as usize] = value;
            return Ok(());
        }
        Err(value)
    }

    fn dictionary_from(shape: &Shape, slots: &mut Vec<Value>) -> Dictionary {
        let mut map = Dictionary::with_capacity_and_hasher(shape.property_count(), FxBuildHasher);
        for (key, value) in shape.keys().iter().zip(slots.drain(..)) {
            map.insert(key.clone(), value);
        }
        map
    }
}

impl std::fmt::Debug for JsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsObject")
            .field("properties", &self.property_count())
            .field("dictionary_mode", &self.is_dictionary_mode())
            .finish()
    }
}
