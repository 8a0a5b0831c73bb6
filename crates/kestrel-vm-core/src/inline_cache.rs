//! Monomorphic inline caches for property access sites
//!
//! Each property read or write site gets one [`InlineCache`] for the property
//! name it accesses. The cache remembers the last shape it saw together with
//! the slot of the property in that shape. A hit costs one pointer comparison
//! and one slot read; a miss costs one full lookup, after which the cache is
//! rebound to the new shape.
//!
//! The cache holds a single (shape, offset) pair. A site that alternates
//! between shapes misses on every alternation. A bounded polymorphic tier
//! would be added as another [`InlineCacheState`] variant holding a small
//! array of pairs, probed before the slow path.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kestrel_vm_bytecode::Function;

use crate::object::JsObject;
use crate::shape::Shape;
use crate::string::PropertyKey;
use crate::value::Value;

/// State of an inline cache
#[derive(Debug, Clone, Default)]
pub enum InlineCacheState {
    /// No shape cached yet
    #[default]
    Uninitialized,
    /// Single shape cached
    Monomorphic {
        /// The cached shape
        shape: Arc<Shape>,
        /// Slot of the guarded property in `shape`
        offset: u32,
    },
}

/// Inline cache for one property access site
pub struct InlineCache {
    key: PropertyKey,
    state: RwLock<InlineCacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InlineCache {
    /// Create an uninitialized cache guarding `key`
    pub fn new(key: PropertyKey) -> Self {
        Self {
            key,
            state: RwLock::new(InlineCacheState::Uninitialized),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The property this site accesses
    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    /// Read the guarded property from `target`.
    pub fn fetch(&self, target: &JsObject) -> Option<Value> {
        let cached = match &*self.state.read() {
            InlineCacheState::Monomorphic { shape, offset } => Some((Arc::clone(shape), *offset)),
            InlineCacheState::Uninitialized => None,
        };

        if let Some((shape, offset)) = cached {
            if let Some(value) = target.read_cached(&shape, offset) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
            tracing::trace!("ic miss on {}: shape {} no longer matches", self.key, shape.id());
            self.unbind();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let lookup = target.extended_get(&self.key);
        if let (Some(shape), Some(offset)) = (lookup.shape, lookup.offset) {
            self.bind(shape, offset);
        }
        lookup.value
    }

    /// Write the guarded property on `target`, adding it if absent.
    pub fn store(&self, target: &JsObject, value: Value) {
        let cached = match &*self.state.read() {
            InlineCacheState::Monomorphic { shape, offset } => Some((Arc::clone(shape), *offset)),
            InlineCacheState::Uninitialized => None,
        };

        let value = match cached {
            Some((shape, offset)) => match target.write_cached(&shape, offset, value) {
                Ok(()) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(value) => {
                    self.unbind();
                    value
                }
            },
            None => value,
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        if let Some((shape, offset)) = target.put_located(self.key.clone(), value) {
            self.bind(shape, offset);
        }
    }

    /// Current state
    pub fn state(&self) -> InlineCacheState {
        self.state.read().clone()
    }

    /// Is the cache bound to a shape
    pub fn is_bound(&self) -> bool {
        matches!(&*self.state.read(), InlineCacheState::Monomorphic { .. })
    }

    /// Number of accesses served from the cached slot
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of accesses that went through a full name lookup
    pub fn slow_path_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop the cached binding and counters
    pub fn reset(&self) {
        self.unbind();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn bind(&self, shape: Arc<Shape>, offset: u32) {
        tracing::trace!("ic bind {} -> shape {} offset {}", self.key, shape.id(), offset);
        *self.state.write() = InlineCacheState::Monomorphic { shape, offset };
    }

    fn unbind(&self) {
        *self.state.write() = InlineCacheState::Uninitialized;
    }
}

impl std::fmt::Debug for InlineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineCache")
            .field("key", &self.key)
            .field("bound", &self.is_bound())
            .field("hits", &self.hit_count())
            .field("misses", &self.slow_path_count())
            .finish()
    }
}

/// The inline caches of one function, indexed by site
#[derive(Debug)]
pub struct FeedbackVector {
    caches: Vec<InlineCache>,
}

impl FeedbackVector {
    /// One cache per property site declared by `function`
    pub fn for_function(function: &Function) -> Self {
        Self {
            caches: function
                .property_sites
                .iter()
                .map(|name| InlineCache::new(PropertyKey::string(name)))
                .collect(),
        }
    }

    /// The cache for site `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<&InlineCache> {
        self.caches.get(index)
    }

    /// Number of sites
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Check if there are no sites
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Sum of slow-path lookups over all sites
    pub fn slow_path_count(&self) -> u64 {
        self.caches.iter().map(InlineCache::slow_path_count).sum()
    }
}
