//! Interned property-name strings
//!
//! Property names are interned so that shape maps and transition keys hash
//! a precomputed value and usually compare by pointer.

use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

/// Global string intern table
static STRING_TABLE: LazyLock<DashMap<Arc<str>, Arc<JsString>>> = LazyLock::new(DashMap::new);

/// An interned string
pub struct JsString {
    data: Arc<str>,
    hash: u64,
}

impl JsString {
    /// Create or retrieve an interned string
    pub fn intern(s: &str) -> Arc<Self> {
        if let Some(existing) = STRING_TABLE.get(s) {
            return existing.clone();
        }

        let data: Arc<str> = Arc::from(s);
        STRING_TABLE
            .entry(data.clone())
            .or_insert_with(|| {
                Arc::new(Self {
                    hash: Self::compute_hash(&data),
                    data,
                })
            })
            .clone()
    }

    /// Get the string contents
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Precomputed hash
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    fn compute_hash(s: &str) -> u64 {
        let mut hasher = FxHasher::default();
        s.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for JsString {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.hash == other.hash && self.data == other.data)
    }
}

impl Eq for JsString {}

impl Hash for JsString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl std::fmt::Debug for JsString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", &*self.data)
    }
}

impl std::fmt::Display for JsString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.data)
    }
}

/// Property key (name or integer index)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String property key
    String(Arc<JsString>),
    /// Integer index
    Index(u32),
}

impl PropertyKey {
    /// Create a string property key
    pub fn string(s: &str) -> Self {
        Self::String(JsString::intern(s))
    }

    /// Create an index property key
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }

    /// The index, for index keys
    pub fn as_index(&self) -> Option<u32> {
        match self {
            Self::Index(i) => Some(*i),
            Self::String(_) => None,
        }
    }

    /// The name, for string keys
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Index(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Index(i) => write!(f, "{}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_shares_allocation() {
        let a = JsString::intern("width");
        let b = JsString::intern("width");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.as_str(), "width");
    }

    #[test]
    fn test_property_key_equality() {
        assert_eq!(PropertyKey::string("x"), PropertyKey::from("x"));
        assert_ne!(PropertyKey::string("x"), PropertyKey::string("y"));
        assert_ne!(PropertyKey::string("0"), PropertyKey::index(0));
        assert_eq!(PropertyKey::index(3).as_index(), Some(3));
        assert_eq!(PropertyKey::string("x").as_str(), Some("x"));
    }
}
