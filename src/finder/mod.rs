//! The import machinery: finder chain and orchestration.
//!
//! # Architecture
//!
//! ```text
//! ImportResolver
//!   ├── ModuleRegistry      (process-wide name → module, singleton per name)
//!   ├── SearchPath          (ordered, mutable, version-counted)
//!   ├── finders             (FrozenFinder, PathFinder, app-registered)
//!   ├── NamespacePathCache  (version-stamped contribution lists)
//!   └── CodeHost            (executes located payloads)
//! ```
//!
//! Every import of every name — submodules included — walks the search
//! path (or, for submodules, the parent's recorded roots) in order; at
//! each position every registered finder is offered a [`Probe`] for
//! that position, and the first spec wins. Precedence therefore follows
//! path order, not finder registration order: a directory prepended
//! ahead of the archive marker shadows a bundled module of the same
//! name. Parent *attributes* are never consulted during locate, so a
//! non-module attribute sharing a submodule's name cannot block the
//! submodule's own lookup. When no position yields a spec, the
//! namespace resolver assembles contributions from all sources in
//! search path order; only if that also comes up empty is the name not
//! found.

pub mod frozen;
pub mod path;

use crate::archive::FrozenArchive;
use crate::config::RuntimeOptions;
use crate::error::ImportError;
use crate::host::CodeHost;
use crate::module::{ModuleObject, ModuleOrigin, SearchLocations};
use crate::nspath::{Location, NamespacePathCache};
use crate::qualname::QualName;
use crate::registry::ModuleRegistry;
use crate::search_path::{PathEntry, SearchPath};
use crate::value::Value;
use log::{debug, info, trace};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

pub use frozen::FrozenFinder;
pub use path::PathFinder;

// =============================================================================
// Finder protocol
// =============================================================================

/// One position being probed for a module, derived from a search path
/// entry (top-level imports) or a parent root (submodules).
///
/// The resolver issues probes strictly in path order; finders answer
/// the positions they serve and pass on the rest.
#[derive(Debug, Clone)]
pub enum Probe {
    /// The archive marker at its search-path position (top-level).
    Archive,
    /// A recorded archive sub-tree root of the parent package.
    Frozen(Arc<str>),
    /// A filesystem directory, from the search path or a parent root.
    Dir(PathBuf),
}

/// A locate query for one component of a dotted import at one probed
/// position.
#[derive(Debug)]
pub struct LocateRequest<'a> {
    /// The name being imported, as the application spelled it. May be
    /// alias-derived and differ from the canonical name.
    pub registry_name: &'a str,
    /// The canonical qualified name: the parent's own recorded name
    /// plus the leaf. Equal to `registry_name` unless an alias is in
    /// play.
    pub canonical: Arc<str>,
    /// The final component being resolved.
    pub leaf: &'a str,
    /// The position being probed.
    pub probe: &'a Probe,
}

/// Descriptor for a located module, produced by `locate` and consumed
/// by `execute`.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    /// Canonical qualified name.
    pub name: Arc<str>,
    /// Where the payload lives.
    pub origin: ModuleOrigin,
    /// Whether the module is a package.
    pub is_package: bool,
    /// Search roots to record for a regular package.
    pub locations: Option<Vec<Location>>,
}

/// An import-path participant: the two-phase locate/execute protocol.
///
/// Finders compose by appending to the chain; none is special-cased.
pub trait Finder: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Decide whether this finder can supply the module from the
    /// probed position; return its descriptor if so. Must be free of
    /// side effects. A finder that does not serve the probed kind of
    /// position returns `None`.
    fn locate(&self, request: &LocateRequest<'_>) -> Option<ModuleSpec>;

    /// Materialize the payload and execute it with `module` as the
    /// sole execution context.
    fn execute(
        &self,
        spec: &ModuleSpec,
        module: &Arc<ModuleObject>,
        resolver: &ImportResolver,
    ) -> Result<(), ImportError>;
}

// =============================================================================
// ImportResolver
// =============================================================================

/// Orchestrates imports across the finder chain, the namespace
/// resolver and the module registry.
pub struct ImportResolver {
    registry: Arc<ModuleRegistry>,
    search_path: Arc<SearchPath>,
    archive: Arc<FrozenArchive>,
    host: Arc<dyn CodeHost>,
    finders: RwLock<Vec<Arc<dyn Finder>>>,
    ns_cache: NamespacePathCache,
    verbose: bool,
}

impl ImportResolver {
    /// Create a resolver over a frozen archive, with the default
    /// finder chain: the frozen finder and the filesystem finder.
    /// Precedence between them is decided per import by search path
    /// order, not by their position in the chain.
    pub fn new(archive: Arc<FrozenArchive>, host: Arc<dyn CodeHost>) -> Self {
        let finders: Vec<Arc<dyn Finder>> = vec![
            Arc::new(FrozenFinder::new(Arc::clone(&archive))),
            Arc::new(PathFinder::new()),
        ];
        Self {
            registry: Arc::new(ModuleRegistry::new()),
            search_path: Arc::new(SearchPath::default()),
            archive,
            host,
            finders: RwLock::new(finders),
            ns_cache: NamespacePathCache::new(),
            verbose: false,
        }
    }

    /// Create a resolver and apply environment-derived options.
    pub fn with_options(
        archive: Arc<FrozenArchive>,
        host: Arc<dyn CodeHost>,
        options: &RuntimeOptions,
    ) -> Self {
        let mut resolver = Self::new(archive, host);
        resolver.verbose = options.verbose_imports;
        for dir in &options.extra_search_dirs {
            resolver.search_path.append(PathEntry::Dir(dir.clone()));
        }
        resolver
    }

    /// The process-wide module registry.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// The process-wide search path.
    pub fn search_path(&self) -> &Arc<SearchPath> {
        &self.search_path
    }

    /// The frozen archive backing this process.
    pub fn archive(&self) -> &Arc<FrozenArchive> {
        &self.archive
    }

    /// The host execution seam.
    pub fn host(&self) -> &Arc<dyn CodeHost> {
        &self.host
    }

    /// Append a finder to the chain.
    pub fn register_finder(&self, finder: Arc<dyn Finder>) {
        self.finders.write().push(finder);
    }

    /// Inject an already-built module (host builtins and the like).
    pub fn insert_module(&self, name: impl Into<Arc<str>>, module: Arc<ModuleObject>) {
        self.registry.insert(name, module);
    }

    /// Drop a module registration.
    pub fn remove_module(&self, name: &str) -> Option<Arc<ModuleObject>> {
        self.registry.remove(name)
    }

    /// Import a module by dotted name.
    ///
    /// Walks the name depth by depth; each component is served from
    /// the registry when cached (the body never re-executes) and
    /// located/executed otherwise. Returns the module registered under
    /// the full requested name.
    pub fn import_module(&self, name: &str) -> Result<Arc<ModuleObject>, ImportError> {
        let qualname = QualName::parse(name).ok_or_else(|| ImportError::InvalidName {
            name: name.into(),
        })?;

        if let Some(module) = self.registry.get(name) {
            return Ok(module);
        }

        let mut current: Option<Arc<ModuleObject>> = None;
        for depth in 1..=qualname.depth() {
            let registry_name = qualname.name_at_depth(depth);
            let leaf = &qualname.parts()[depth - 1];

            let module = match self.registry.get(&registry_name) {
                Some(module) => module,
                None => {
                    let module = self.load(&registry_name, leaf, current.as_ref())?;
                    // Bind the child on the parent at load time only;
                    // cached re-imports never re-bind, so a deleted
                    // shadowing attribute stays deleted.
                    if let Some(parent) = &current {
                        parent.set_attr(leaf, Value::Module(Arc::clone(&module)));
                    }
                    module
                }
            };
            current = Some(module);
        }

        current.ok_or_else(|| ImportError::InvalidName { name: name.into() })
    }

    /// `from module import name`.
    ///
    /// Attribute lookup first — this side is intentionally shadowable —
    /// then the registry, then a full submodule import for packages.
    pub fn import_from(
        &self,
        module: &Arc<ModuleObject>,
        name: &str,
    ) -> Result<Value, ImportError> {
        if let Some(value) = module.get_attr(name) {
            return Ok(value);
        }

        let full = format!("{}.{}", module.name(), name);
        if let Some(sub) = self.registry.get(&full) {
            return Ok(Value::Module(sub));
        }

        if module.is_package() {
            match self.import_module(&full) {
                Ok(sub) => return Ok(Value::Module(sub)),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        Err(ImportError::CannotImportName {
            name: name.into(),
            module: module.name_arc(),
        })
    }

    /// Locate and execute one component that is not yet registered.
    fn load(
        &self,
        registry_name: &str,
        leaf: &str,
        parent: Option<&Arc<ModuleObject>>,
    ) -> Result<Arc<ModuleObject>, ImportError> {
        // The parent's *recorded* context drives submodule lookup: its
        // canonical name keys the archive and its search roots are
        // materialized here, at the moment of observation.
        let (canonical, parent_locations): (Arc<str>, Option<Vec<Location>>) = match parent {
            None => (Arc::from(registry_name), None),
            Some(parent) => {
                if !parent.is_package() {
                    return Err(ImportError::NotAPackage {
                        name: registry_name.into(),
                        parent: parent.name_arc(),
                    });
                }
                let canonical: Arc<str> = format!("{}.{}", parent.name(), leaf).into();
                let locations = match parent.search_locations() {
                    Some(SearchLocations::Fixed(locations)) => locations,
                    Some(SearchLocations::Namespace(nspath)) => {
                        nspath.roots(&self.search_path, &self.archive)
                    }
                    None => Vec::new(),
                };
                (canonical, Some(locations))
            }
        };

        // Importing through an alias of an already-imported subtree
        // must yield the existing object, not a second copy.
        if canonical.as_ref() != registry_name {
            if let Some(existing) = self.registry.get(&canonical) {
                self.registry.insert(registry_name, Arc::clone(&existing));
                return Ok(existing);
            }
        }

        // Top-level imports probe the search path entries; submodules
        // probe the parent's recorded roots. Both are walked strictly
        // in order, so path position decides precedence between the
        // archive and external directories.
        let probes: Vec<Probe> = match &parent_locations {
            None => self
                .search_path
                .snapshot()
                .into_iter()
                .map(|entry| match entry {
                    PathEntry::Archive => Probe::Archive,
                    PathEntry::Dir(dir) => Probe::Dir(dir),
                })
                .collect(),
            Some(locations) => locations
                .iter()
                .map(|location| match location {
                    Location::Frozen(prefix) => Probe::Frozen(Arc::clone(prefix)),
                    Location::Dir(dir) => Probe::Dir(dir.clone()),
                })
                .collect(),
        };

        let finders: Vec<Arc<dyn Finder>> = self.finders.read().clone();
        for probe in &probes {
            let request = LocateRequest {
                registry_name,
                canonical: Arc::clone(&canonical),
                leaf,
                probe,
            };
            for finder in &finders {
                let Some(spec) = finder.locate(&request) else {
                    trace!(
                        "finder {} passed on {:?} at {:?}",
                        finder.name(),
                        registry_name,
                        probe
                    );
                    continue;
                };
                if self.verbose {
                    info!(
                        "finder {} located {:?} as {:?}",
                        finder.name(),
                        registry_name,
                        spec.origin
                    );
                } else {
                    debug!(
                        "finder {} located {:?} as {:?}",
                        finder.name(),
                        registry_name,
                        spec.origin
                    );
                }
                return self.load_spec(finder.as_ref(), &spec, registry_name);
            }
        }

        self.load_namespace(&canonical, registry_name)
    }

    /// Register a located module and execute its body.
    fn load_spec(
        &self,
        finder: &dyn Finder,
        spec: &ModuleSpec,
        registry_name: &str,
    ) -> Result<Arc<ModuleObject>, ImportError> {
        let module = Arc::new(ModuleObject::new(
            Arc::clone(&spec.name),
            spec.origin.clone(),
            spec.is_package,
        ));
        if let Some(locations) = &spec.locations {
            module.set_search_locations(SearchLocations::Fixed(locations.clone()));
        }

        // Install before executing so cyclic imports observe the
        // partially initialized module.
        self.registry.insert(Arc::clone(&spec.name), Arc::clone(&module));
        let aliased = spec.name.as_ref() != registry_name;
        if aliased {
            self.registry.insert(registry_name, Arc::clone(&module));
        }

        match finder.execute(spec, &module, self) {
            Ok(()) => Ok(module),
            Err(err) => {
                // Roll back every name registered for this module so a
                // retry never sees a half-initialized module.
                self.registry.remove(&spec.name);
                if aliased {
                    self.registry.remove(registry_name);
                }
                Err(err)
            }
        }
    }

    /// Assemble a namespace package from current contributions, or
    /// report not-found.
    fn load_namespace(
        &self,
        canonical: &Arc<str>,
        registry_name: &str,
    ) -> Result<Arc<ModuleObject>, ImportError> {
        let nspath = self.ns_cache.lookup(canonical);
        let roots = nspath.roots(&self.search_path, &self.archive);
        if roots.is_empty() {
            return Err(ImportError::NotFound {
                name: registry_name.into(),
            });
        }

        debug!(
            "assembled namespace package {:?} from {} root(s)",
            canonical,
            roots.len()
        );
        let module = Arc::new(ModuleObject::new(
            Arc::clone(canonical),
            ModuleOrigin::Namespace,
            true,
        ));
        module.set_search_locations(SearchLocations::Namespace(nspath));

        self.registry.insert(Arc::clone(canonical), Arc::clone(&module));
        if canonical.as_ref() != registry_name {
            self.registry.insert(registry_name, Arc::clone(&module));
        }
        Ok(module)
    }
}

impl std::fmt::Debug for ImportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportResolver")
            .field("modules", &self.registry.len())
            .field("search_path", &self.search_path.snapshot())
            .field("finders", &self.finders.read().len())
            .finish()
    }
}
