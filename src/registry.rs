//! Process-wide module registry.
//!
//! The runtime's single source of truth for loaded modules: one module
//! object per qualified name, created on first successful import and
//! destroyed only at process exit. Re-importing an already-loaded name
//! returns the same object and never re-executes its body.
//!
//! Inserting an existing module under a second name creates an alias;
//! the module's own canonical name is unaffected.

use crate::module::ModuleObject;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Qualified name → module map behind an `RwLock`.
///
/// Reads dominate (every import starts with a cache probe), so the
/// lock is a reader-writer lock rather than a mutex.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: RwLock<FxHashMap<Arc<str>, Arc<ModuleObject>>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a module by qualified name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<Arc<ModuleObject>> {
        self.modules.read().get(name).cloned()
    }

    /// Register a module under a qualified name.
    ///
    /// Registering an already-loaded module under a different name
    /// creates an alias.
    pub fn insert(&self, name: impl Into<Arc<str>>, module: Arc<ModuleObject>) {
        self.modules.write().insert(name.into(), module);
    }

    /// Remove a registration. Returns the module if it was present.
    pub fn remove(&self, name: &str) -> Option<Arc<ModuleObject>> {
        self.modules.write().remove(name)
    }

    /// Check whether a name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    /// Get the number of registered names.
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Get all registered names.
    pub fn names(&self) -> Vec<Arc<str>> {
        self.modules.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleOrigin;

    fn synthetic(name: &str) -> Arc<ModuleObject> {
        Arc::new(ModuleObject::new(name, ModuleOrigin::Synthetic, false))
    }

    #[test]
    fn test_insert_get() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());

        let m = synthetic("m");
        registry.insert("m", m.clone());
        assert!(registry.contains("m"));
        assert!(Arc::ptr_eq(&registry.get("m").unwrap(), &m));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = ModuleRegistry::new();
        registry.insert("m", synthetic("m"));
        assert!(registry.remove("m").is_some());
        assert!(registry.remove("m").is_none());
        assert!(!registry.contains("m"));
    }

    #[test]
    fn test_alias_shares_object() {
        let registry = ModuleRegistry::new();
        let m = synthetic("real");
        registry.insert("real", m.clone());
        registry.insert("alias", m.clone());

        let a = registry.get("alias").unwrap();
        let r = registry.get("real").unwrap();
        assert!(Arc::ptr_eq(&a, &r));
        // The canonical name is unchanged by aliasing.
        assert_eq!(a.name(), "real");
    }
}
