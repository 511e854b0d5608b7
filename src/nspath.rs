//! Namespace package path resolution.
//!
//! A namespace package has no single defining directory: every search
//! path entry that contains a matching sub-directory (or archive
//! sub-tree) contributes a root, and the contribution order must match
//! the search path order at all times. The computed list is cached and
//! stamped with the search path version observed at computation; a
//! stale stamp triggers a full rescan, a fresh stamp returns the cache
//! unchanged.

use crate::archive::FrozenArchive;
use crate::search_path::{PathEntry, SearchPath};
use log::{debug, trace};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// One contributing root of a package.
///
/// Archive-internal and filesystem roots are ordered together in one
/// list, by search path position, never grouped by source kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A sub-tree of the frozen archive, named by its qualified name.
    Frozen(Arc<str>),
    /// A filesystem directory.
    Dir(PathBuf),
}

#[derive(Debug, Clone)]
struct Computed {
    stamp: u64,
    roots: Vec<Location>,
}

/// Per-package ordered set of contributing roots, version-stamped.
///
/// Shared (`Arc`) between the cache and every namespace module that
/// recorded it as its search context, so all consumers observe the
/// same list. Lives for the process; staleness invalidates, nothing
/// destroys it.
#[derive(Debug)]
pub struct NamespacePath {
    /// Dotted package name.
    package: Arc<str>,
    /// The package name as a relative filesystem path.
    relpath: PathBuf,
    state: RwLock<Option<Computed>>,
}

impl NamespacePath {
    pub fn new(package: impl Into<Arc<str>>) -> Self {
        let package = package.into();
        let relpath = package.split('.').collect::<PathBuf>();
        Self {
            package,
            relpath,
            state: RwLock::new(None),
        }
    }

    /// The package this path belongs to.
    #[inline]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Current contributing roots, in search path order.
    ///
    /// Returns the cached list when the stamp matches the current
    /// search path version; otherwise rescans. Recomputation is
    /// idempotent under concurrency: the rescan works from a
    /// consistent versioned snapshot and the write-back keeps the
    /// newest stamp, so racing recomputations agree.
    pub fn roots(&self, search_path: &SearchPath, archive: &FrozenArchive) -> Vec<Location> {
        let current = search_path.version();
        if let Some(computed) = self.state.read().as_ref() {
            if computed.stamp == current {
                return computed.roots.clone();
            }
        }

        let (stamp, entries) = search_path.versioned_snapshot();
        let roots = self.scan(&entries, archive);
        debug!(
            "namespace path for {:?} recomputed at version {}: {} root(s)",
            self.package,
            stamp,
            roots.len()
        );

        let mut state = self.state.write();
        match state.as_ref() {
            Some(existing) if existing.stamp >= stamp => existing.roots.clone(),
            _ => {
                *state = Some(Computed {
                    stamp,
                    roots: roots.clone(),
                });
                roots
            }
        }
    }

    fn scan(&self, entries: &[PathEntry], archive: &FrozenArchive) -> Vec<Location> {
        let mut roots = Vec::new();
        for entry in entries {
            match entry {
                PathEntry::Archive => {
                    if archive.contains_dir(&self.package) {
                        trace!("namespace {:?}: archive contributes", self.package);
                        roots.push(Location::Frozen(Arc::clone(&self.package)));
                    }
                }
                PathEntry::Dir(dir) => {
                    let candidate = dir.join(&self.relpath);
                    if candidate.is_dir() {
                        trace!(
                            "namespace {:?}: directory {:?} contributes",
                            self.package,
                            candidate
                        );
                        roots.push(Location::Dir(candidate));
                    }
                }
            }
        }
        roots
    }
}

/// Lazily created, process-lifetime cache of namespace paths, one per
/// package name.
#[derive(Debug, Default)]
pub struct NamespacePathCache {
    paths: RwLock<FxHashMap<Arc<str>, Arc<NamespacePath>>>,
}

impl NamespacePathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the shared path object for a package.
    pub fn lookup(&self, package: &str) -> Arc<NamespacePath> {
        if let Some(path) = self.paths.read().get(package) {
            return Arc::clone(path);
        }
        let mut paths = self.paths.write();
        Arc::clone(
            paths
                .entry(Arc::from(package))
                .or_insert_with(|| Arc::new(NamespacePath::new(package))),
        )
    }
}
