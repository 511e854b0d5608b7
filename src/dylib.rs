//! Dynamic library location by logical name.
//!
//! By-name native library load requests are intercepted and redirected
//! to bundled copies when the build-time alias table has an entry —
//! the bundled copy always wins over any same-named library elsewhere
//! on the system, so the frozen artifact loads exactly what it shipped
//! with. On an alias miss the request falls through to ordinary
//! system-wide resolution. Names that correspond to functionality
//! statically linked into the host runtime never resolve at all.
//!
//! All tables are immutable after construction; the locator may be
//! called concurrently from any thread, including from native code far
//! outside any import.

use crate::error::LibraryError;
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Requested loading flavor. Recorded for diagnostics; it never alters
/// resolution precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    #[default]
    Default,
    Lazy,
    Global,
}

/// Result of a successful location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLibrary {
    /// A copy shipped inside the bundle.
    Bundled(PathBuf),
    /// A library found by ordinary system resolution.
    System(PathBuf),
}

impl ResolvedLibrary {
    /// The path to hand to the loader.
    pub fn path(&self) -> &Path {
        match self {
            Self::Bundled(path) | Self::System(path) => path,
        }
    }
}

/// Locates shared libraries for the frozen application.
#[derive(Debug)]
pub struct LibraryLocator {
    bundle_root: PathBuf,
    /// Logical name → bundled path, relative to the bundle root.
    aliases: FxHashMap<String, PathBuf>,
    /// Names implemented as statically-linked runtime built-ins.
    statically_linked: FxHashSet<String>,
    /// Directories consulted for system fallback, in order.
    system_dirs: Vec<PathBuf>,
}

impl LibraryLocator {
    /// Create a locator with an empty alias table and the platform's
    /// default system search directories.
    pub fn new(bundle_root: impl Into<PathBuf>) -> Self {
        Self {
            bundle_root: bundle_root.into(),
            aliases: FxHashMap::default(),
            statically_linked: FxHashSet::default(),
            system_dirs: default_system_dirs(),
        }
    }

    /// Load the build-time alias table from its JSON form
    /// (`{ "png": "libs/libpng16.so", ... }`).
    pub fn load_aliases(&mut self, bytes: &[u8]) -> Result<(), LibraryError> {
        let table: HashMap<String, String> =
            serde_json::from_slice(bytes).map_err(|err| LibraryError::MalformedTable {
                reason: err.to_string(),
            })?;
        for (name, rel_path) in table {
            self.aliases.insert(name, PathBuf::from(rel_path));
        }
        Ok(())
    }

    /// Register one alias.
    pub fn register_alias(&mut self, name: &str, bundled_path: impl Into<PathBuf>) {
        self.aliases.insert(name.to_string(), bundled_path.into());
    }

    /// Mark a name as statically linked into the runtime.
    pub fn mark_statically_linked(&mut self, name: &str) {
        self.statically_linked.insert(name.to_string());
    }

    /// Replace the system search directories (tests, embedders).
    pub fn set_system_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.system_dirs = dirs;
    }

    /// Resolve a logical library name to a loadable path.
    pub fn locate(&self, name: &str, mode: LoadMode) -> Result<ResolvedLibrary, LibraryError> {
        if self.statically_linked.contains(name) {
            debug!("library {:?} is statically linked; refusing to resolve", name);
            return Err(LibraryError::StaticallyLinked { name: name.into() });
        }

        if let Some(rel_path) = self.aliases.get(name) {
            let path = self.bundle_root.join(rel_path);
            debug!("library {:?} ({:?}) -> bundled {:?}", name, mode, path);
            return Ok(ResolvedLibrary::Bundled(path));
        }

        // Alias miss: ordinary system resolution, never a race with
        // the bundled table.
        for dir in &self.system_dirs {
            for candidate in candidate_file_names(name) {
                let path = dir.join(&candidate);
                trace!("library {:?}: probing {:?}", name, path);
                if path.is_file() {
                    debug!("library {:?} ({:?}) -> system {:?}", name, mode, path);
                    return Ok(ResolvedLibrary::System(path));
                }
            }
        }

        Err(LibraryError::NotFound { name: name.into() })
    }
}

/// Platform file-name patterns for a logical library name.
fn candidate_file_names(name: &str) -> Vec<String> {
    #[cfg(target_os = "windows")]
    {
        vec![format!("{}.dll", name), name.to_string()]
    }
    #[cfg(target_os = "macos")]
    {
        vec![
            format!("lib{}.dylib", name),
            format!("{}.dylib", name),
            format!("lib{}.so", name),
            name.to_string(),
        ]
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            format!("lib{}.so", name),
            format!("{}.so", name),
            name.to_string(),
        ]
    }
}

/// The loader path environment variable plus the platform defaults.
fn default_system_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    let var = "PATH";
    #[cfg(target_os = "macos")]
    let var = "DYLD_LIBRARY_PATH";
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let var = "LD_LIBRARY_PATH";

    if let Some(value) = std::env::var_os(var) {
        dirs.extend(std::env::split_paths(&value));
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs.push(PathBuf::from("/usr/local/lib"));
        dirs.push(PathBuf::from("/usr/lib"));
        dirs.push(PathBuf::from("/lib"));
    }
    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/opt/homebrew/lib"));
    }

    dirs
}
