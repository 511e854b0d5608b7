//! Runtime options for a frozen process.
//!
//! Everything here is read once at startup; nothing mutates these
//! options afterwards. Search-path changes at run time go through
//! `SearchPath` directly.

use std::env;
use std::path::PathBuf;

/// Environment variable enabling per-import debug logging.
pub const ENV_VERBOSE_IMPORTS: &str = "PERMAFROST_VERBOSE_IMPORTS";
/// Environment variable listing extra search directories, in the
/// platform's path-list syntax.
pub const ENV_EXTRA_PATH: &str = "PERMAFROST_PATH";

/// Startup options for the import machinery.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Root directory of the unpacked bundle.
    pub bundle_root: PathBuf,
    /// Log every finder decision at debug level.
    pub verbose_imports: bool,
    /// Directories appended to the search path after the archive entry.
    pub extra_search_dirs: Vec<PathBuf>,
}

impl RuntimeOptions {
    /// Options with no environment applied.
    pub fn new(bundle_root: impl Into<PathBuf>) -> Self {
        Self {
            bundle_root: bundle_root.into(),
            verbose_imports: false,
            extra_search_dirs: Vec::new(),
        }
    }

    /// Options derived from the process environment.
    pub fn from_env(bundle_root: impl Into<PathBuf>) -> Self {
        let mut options = Self::new(bundle_root);

        if let Ok(value) = env::var(ENV_VERBOSE_IMPORTS) {
            options.verbose_imports = matches!(value.as_str(), "1" | "true" | "yes");
        }
        if let Some(value) = env::var_os(ENV_EXTRA_PATH) {
            options.extra_search_dirs = env::split_paths(&value).collect();
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RuntimeOptions::new("/bundle");
        assert_eq!(options.bundle_root, PathBuf::from("/bundle"));
        assert!(!options.verbose_imports);
        assert!(options.extra_search_dirs.is_empty());
    }
}
