//! # Attribute Views
//!
//! Wrappers that expose a keyed mapping's entries as named attributes.
//! Both variants own their entries; wrapping moves a mapping into the
//! view without copying it and only changes the access surface.
//!
//! - [`AttrMap`] is strict: reading an absent attribute fails and writes
//!   are accepted only for attributes that already exist, so the set of
//!   fields is fixed once the view is built.
//! - [`FallbackAttrMap`] is tolerant: reading an absent attribute yields
//!   `None`. The schema normalizer uses it to probe optional fields
//!   (`default`, `module`, `arguments`, ...) uniformly.

use std::collections::BTreeMap;

use crate::error::AttributeError;

/// Strict attribute view over a keyed mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttrMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> AttrMap<V> {
    /// Wrap a mapping.
    pub fn new(entries: BTreeMap<String, V>) -> Self {
        Self { entries }
    }

    /// Read an attribute.
    ///
    /// # Errors
    ///
    /// Returns `AttributeError::Missing` if the attribute does not exist.
    pub fn attr(&self, name: &str) -> Result<&V, AttributeError> {
        self.entries
            .get(name)
            .ok_or_else(|| AttributeError::Missing(name.to_string()))
    }

    /// Overwrite an existing attribute, returning its previous value.
    ///
    /// # Errors
    ///
    /// Returns `AttributeError::Closed` if the attribute does not exist.
    pub fn set_attr(&mut self, name: &str, value: V) -> Result<V, AttributeError> {
        match self.entries.get_mut(name) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(AttributeError::Closed(name.to_string())),
        }
    }

    /// Mapping-style read.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow the underlying mapping.
    pub fn as_map(&self) -> &BTreeMap<String, V> {
        &self.entries
    }

    /// Mutable access to the values. The key set stays fixed.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    /// Unwrap the view, returning the underlying mapping.
    pub fn into_inner(self) -> BTreeMap<String, V> {
        self.entries
    }
}

impl<V> From<BTreeMap<String, V>> for AttrMap<V> {
    fn from(entries: BTreeMap<String, V>) -> Self {
        Self::new(entries)
    }
}

impl<V> From<FallbackAttrMap<V>> for AttrMap<V> {
    fn from(view: FallbackAttrMap<V>) -> Self {
        Self::new(view.entries)
    }
}

impl<V> IntoIterator for AttrMap<V> {
    type Item = (String, V);
    type IntoIter = std::collections::btree_map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Fallback-tolerant attribute view over a keyed mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FallbackAttrMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> FallbackAttrMap<V> {
    /// Wrap a mapping.
    pub fn new(entries: BTreeMap<String, V>) -> Self {
        Self { entries }
    }

    /// Read an attribute, yielding `None` when it is absent.
    pub fn attr(&self, name: &str) -> Option<&V> {
        self.entries.get(name)
    }

    /// Remove an attribute, yielding `None` when it is absent.
    pub fn take_attr(&mut self, name: &str) -> Option<V> {
        self.entries.remove(name)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Unwrap the view, returning the underlying mapping.
    pub fn into_inner(self) -> BTreeMap<String, V> {
        self.entries
    }
}

impl<V> From<BTreeMap<String, V>> for FallbackAttrMap<V> {
    fn from(entries: BTreeMap<String, V>) -> Self {
        Self::new(entries)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for FallbackAttrMap<serde_json::Value> {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::new(map.into_iter().collect())
    }
}
