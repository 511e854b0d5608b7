//! The process-wide module search path.
//!
//! An ordered list of locations consulted for module resolution: the
//! frozen archive marker plus any number of filesystem directories.
//! Application code may mutate it at any time; derived caches (the
//! namespace paths) detect mutation through a version counter that
//! every mutation bumps while holding the write lock, so a
//! `versioned_snapshot` is always internally consistent.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// One entry of the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEntry {
    /// The sealed frozen archive bundled into the executable.
    Archive,
    /// A filesystem directory.
    Dir(PathBuf),
}

/// Ordered, mutable, process-wide search path with a monotonically
/// increasing version.
#[derive(Debug)]
pub struct SearchPath {
    entries: RwLock<Vec<PathEntry>>,
    version: AtomicU64,
}

impl SearchPath {
    /// Create a search path with the given initial entries.
    pub fn new(entries: Vec<PathEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            version: AtomicU64::new(0),
        }
    }

    /// The current version. Advances on every mutation.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> Vec<PathEntry> {
        self.entries.read().clone()
    }

    /// Consistent (version, entries) pair.
    ///
    /// Taken under the read lock, so a concurrent mutation cannot slip
    /// between reading the entries and reading the version.
    pub fn versioned_snapshot(&self) -> (u64, Vec<PathEntry>) {
        let entries = self.entries.read();
        let version = self.version.load(Ordering::Acquire);
        (version, entries.clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Check if an entry is present.
    pub fn contains(&self, entry: &PathEntry) -> bool {
        self.entries.read().contains(entry)
    }

    /// Append an entry.
    pub fn append(&self, entry: PathEntry) {
        let mut entries = self.entries.write();
        entries.push(entry);
        self.bump();
    }

    /// Prepend an entry.
    pub fn prepend(&self, entry: PathEntry) {
        let mut entries = self.entries.write();
        entries.insert(0, entry);
        self.bump();
    }

    /// Insert an entry at an index (clamped to the current length).
    pub fn insert(&self, index: usize, entry: PathEntry) {
        let mut entries = self.entries.write();
        let index = index.min(entries.len());
        entries.insert(index, entry);
        self.bump();
    }

    /// Remove the first occurrence of an entry. Returns `true` if
    /// something was removed.
    pub fn remove(&self, entry: &PathEntry) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|e| e == entry) {
            Some(idx) => {
                entries.remove(idx);
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Truncate to the first `len` entries.
    pub fn truncate(&self, len: usize) {
        let mut entries = self.entries.write();
        if entries.len() > len {
            entries.truncate(len);
            self.bump();
        }
    }

    /// Replace the whole path.
    pub fn set(&self, new_entries: Vec<PathEntry>) {
        let mut entries = self.entries.write();
        *entries = new_entries;
        self.bump();
    }

    // Callers hold the write lock, so snapshot readers observe the new
    // version together with the new entries.
    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        Self::new(vec![PathEntry::Archive])
    }
}
