//! Runtime module resolution for frozen application bundles.
//!
//! A frozen application ships its modules inside a sealed archive
//! instead of as loose files. This crate is the runtime side of that
//! arrangement: it locates modules in the archive, cooperates with the
//! ordinary filesystem import path, assembles namespace packages whose
//! portions straddle the archive/filesystem boundary, answers
//! distribution-metadata queries from a build-time table, and redirects
//! by-name shared-library loads to bundled copies.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────────────┐
//!       import name ──▶ │  ImportResolver  │──▶ Arc<ModuleObject>
//!                       └────────┬─────────┘
//!              ┌─────────────────┼──────────────────┐
//!              ▼                 ▼                  ▼
//!      ┌──────────────┐  ┌──────────────┐  ┌───────────────┐
//!      │ FrozenFinder │  │  PathFinder  │  │ NamespacePath │
//!      │  (archive)   │  │ (filesystem) │  │   resolver    │
//!      └──────┬───────┘  └──────┬───────┘  └───────┬───────┘
//!             ▼                 ▼                  ▼
//!      ┌──────────────┐  ┌──────────────┐  ┌───────────────┐
//!      │FrozenArchive │  │  SearchPath  │  │ModuleRegistry │
//!      └──────────────┘  └──────────────┘  └───────────────┘
//! ```
//!
//! Module bodies themselves are executed by the embedding runtime
//! through the [`CodeHost`] seam; this crate never interprets payload
//! bytes.
//!
//! Sibling concerns that live outside the import path proper:
//! [`DistRegistry`] (distribution metadata), [`LibraryLocator`]
//! (shared-library redirection), [`RuntimeOptions`] (startup
//! configuration).

pub mod archive;
pub mod config;
pub mod dylib;
pub mod error;
pub mod finder;
pub mod host;
pub mod metadata;
pub mod module;
pub mod nspath;
pub mod qualname;
pub mod registry;
pub mod search_path;
pub mod value;

pub use archive::{ArchiveBuilder, ArchiveEntry, EntryKind, FrozenArchive};
pub use config::RuntimeOptions;
pub use dylib::{LibraryLocator, LoadMode, ResolvedLibrary};
pub use error::{ArchiveError, HostError, ImportError, LibraryError, MetadataError};
pub use finder::{
    Finder, FrozenFinder, ImportResolver, LocateRequest, ModuleSpec, PathFinder, Probe,
};
pub use host::{CodeHost, NullHost};
pub use metadata::{DistRegistry, Distribution, DistributionRecord};
pub use module::{ModuleObject, ModuleOrigin, SearchLocations};
pub use nspath::{Location, NamespacePath, NamespacePathCache};
pub use qualname::QualName;
pub use registry::ModuleRegistry;
pub use search_path::{PathEntry, SearchPath};
pub use value::Value;
