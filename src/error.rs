//! Error types for the frozen-import core.
//!
//! One enum per failure domain. The not-found class (`NotFound`,
//! `NotAPackage`, `CannotImportName`) is ordinary and expected; callers
//! that catch it broadly behave identically to the unfrozen case.
//! `ExecutionFailed` preserves the host's original error as its source
//! and is never translated.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by the host while executing a module body.
///
/// The host runtime owns its own error hierarchy; the import machinery
/// carries it through unmodified.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while opening or reading a frozen archive.
///
/// Any `Malformed` or `UnsupportedVersion` at open time is fatal: the
/// bundle was mis-assembled and the process cannot start. A missing
/// entry is *not* an error (lookups return `Option`).
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to read archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed archive: {reason}")]
    Malformed { reason: String },

    #[error("unsupported archive format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },
}

/// Errors raised by the import machinery.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The requested name is not a valid dotted module name.
    #[error("invalid module name {name:?}")]
    InvalidName { name: Arc<str> },

    /// No finder could supply the module and no namespace portions exist.
    #[error("no module named {name:?}")]
    NotFound { name: Arc<str> },

    /// A submodule was requested below a non-package module.
    #[error("no module named {name:?}; {parent:?} is not a package")]
    NotAPackage { name: Arc<str>, parent: Arc<str> },

    /// `from module import name` found neither an attribute, a cached
    /// submodule, nor a loadable submodule.
    #[error("cannot import name {name:?} from {module:?}")]
    CannotImportName { name: Arc<str>, module: Arc<str> },

    /// The module body raised during execution. The registry entry has
    /// been rolled back; the original cause is attached unmodified.
    #[error("error while executing module {module:?}")]
    ExecutionFailed {
        module: Arc<str>,
        #[source]
        source: HostError,
    },

    /// A filesystem-backed module's source could not be read.
    #[error("failed to read source for module {module:?} from {path:?}")]
    SourceRead {
        module: Arc<str>,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    /// Whether this error belongs to the ordinary "module not found"
    /// class (as opposed to an execution or I/O failure).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::NotFound { .. }
                | Self::NotAPackage { .. }
                | Self::CannotImportName { .. }
        )
    }
}

/// Errors raised by the distribution metadata shim.
///
/// `NotFound` is a normal negative result. `Malformed` means the
/// build-time collector emitted a defective record; it is never
/// silently defaulted.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no distribution metadata for {name:?}")]
    NotFound { name: Arc<str> },

    #[error("malformed distribution metadata for {name:?}: {reason}")]
    Malformed { name: Arc<str>, reason: String },
}

/// Errors raised by the dynamic library locator.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The build-time alias table does not parse.
    #[error("malformed library alias table: {reason}")]
    MalformedTable { reason: String },

    /// The name refers to functionality statically linked into the
    /// host runtime; it must never resolve to a shared object.
    #[error("library {name:?} is statically linked into the runtime")]
    StaticallyLinked { name: Arc<str> },

    /// Neither the bundle nor the system provides the library.
    #[error("library {name:?} not found")]
    NotFound { name: Arc<str> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_class() {
        let err = ImportError::NotFound { name: "zzz".into() };
        assert!(err.is_not_found());

        let err = ImportError::NotAPackage {
            name: "a.b".into(),
            parent: "a".into(),
        };
        assert!(err.is_not_found());
    }

    #[test]
    fn test_execution_failure_preserves_cause() {
        use std::error::Error;

        let cause: HostError = "division by zero".into();
        let err = ImportError::ExecutionFailed {
            module: "badmod".into(),
            source: cause,
        };
        assert!(!err.is_not_found());
        let source = err.source().expect("source must be preserved");
        assert_eq!(source.to_string(), "division by zero");
    }

    #[test]
    fn test_metadata_variants_are_distinct() {
        let nf = MetadataError::NotFound { name: "d".into() };
        let bad = MetadataError::Malformed {
            name: "d".into(),
            reason: "empty version".into(),
        };
        assert!(nf.to_string().contains("no distribution"));
        assert!(bad.to_string().contains("malformed"));
    }
}
