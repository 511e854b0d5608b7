//! `ModuleObject` — runtime representation of an imported module.
//!
//! Stores the module's attributes, its canonical name, where its code
//! came from, and — for packages — the recorded search context that
//! drives all submodule resolution. Aliasing a module under a second
//! registry name never changes any of these: child lookups always
//! follow the recorded context, not the name the module was reached by.

use crate::nspath::{Location, NamespacePath};
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

// =============================================================================
// Origin
// =============================================================================

/// Where a module's code came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// Payload stored in the frozen archive under the given entry name.
    Frozen { entry: Arc<str> },
    /// Loose source file on the filesystem.
    Source { path: PathBuf },
    /// Namespace package: no code, only contributing roots.
    Namespace,
    /// Injected directly by the host (no locate/execute phase).
    Synthetic,
}

/// Recorded search context for a package.
#[derive(Debug, Clone)]
pub enum SearchLocations {
    /// Regular package: fixed roots recorded at load time.
    Fixed(Vec<Location>),
    /// Namespace package: shared, version-stamped contribution list.
    Namespace(Arc<NamespacePath>),
}

// =============================================================================
// ModuleObject
// =============================================================================

/// A loaded module with attribute storage.
///
/// Attribute lookup is O(1) via `FxHashMap` with `Arc<str>` keys;
/// the table is behind an `RwLock` for concurrent read access.
#[derive(Debug)]
pub struct ModuleObject {
    /// Canonical qualified name — the name the module was created
    /// under. Registry aliases do not change it.
    name: Arc<str>,

    /// Where the module's code came from.
    origin: ModuleOrigin,

    /// Whether the module is a package.
    is_package: bool,

    /// Module attributes.
    attrs: RwLock<FxHashMap<Arc<str>, Value>>,

    /// Recorded search context (packages only).
    search_locations: RwLock<Option<SearchLocations>>,
}

impl ModuleObject {
    /// Create a new empty module.
    pub fn new(name: impl Into<Arc<str>>, origin: ModuleOrigin, is_package: bool) -> Self {
        Self {
            name: name.into(),
            origin,
            is_package,
            attrs: RwLock::new(FxHashMap::default()),
            search_locations: RwLock::new(None),
        }
    }

    /// Get the canonical qualified name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the canonical qualified name as a shared string.
    #[inline]
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Get the module's origin.
    #[inline]
    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    /// Whether the module is a package.
    #[inline]
    pub fn is_package(&self) -> bool {
        self.is_package
    }

    /// Get an attribute, or `None` if absent.
    #[inline]
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.attrs.read().get(name).cloned()
    }

    /// Set an attribute.
    #[inline]
    pub fn set_attr(&self, name: &str, value: Value) {
        self.attrs.write().insert(Arc::from(name), value);
    }

    /// Delete an attribute. Returns `true` if it existed.
    #[inline]
    pub fn del_attr(&self, name: &str) -> bool {
        self.attrs.write().remove(name).is_some()
    }

    /// Check if the module has an attribute.
    #[inline]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.read().contains_key(name)
    }

    /// Get all attribute names.
    pub fn attr_names(&self) -> Vec<Arc<str>> {
        self.attrs.read().keys().cloned().collect()
    }

    /// Get the number of attributes.
    #[inline]
    pub fn attr_count(&self) -> usize {
        self.attrs.read().len()
    }

    /// Record the package's search context.
    pub fn set_search_locations(&self, locations: SearchLocations) {
        *self.search_locations.write() = Some(locations);
    }

    /// Get the recorded search context, if any.
    pub fn search_locations(&self) -> Option<SearchLocations> {
        self.search_locations.read().clone()
    }
}
