//! The frozen finder: serves modules out of the sealed archive.
//!
//! Answers the archive-backed probes only — the archive marker at its
//! search-path position for top-level names, and the parent's recorded
//! archive roots for submodules — so aliased parents resolve children
//! by their real location, and a directory placed ahead of the archive
//! marker shadows a bundled module of the same name.

use crate::archive::{EntryKind, FrozenArchive};
use crate::error::ImportError;
use crate::finder::{Finder, ImportResolver, LocateRequest, ModuleSpec, Probe};
use crate::module::{ModuleObject, ModuleOrigin};
use crate::nspath::Location;
use std::sync::Arc;

/// Archive-backed import-path participant.
#[derive(Debug)]
pub struct FrozenFinder {
    archive: Arc<FrozenArchive>,
}

impl FrozenFinder {
    pub fn new(archive: Arc<FrozenArchive>) -> Self {
        Self { archive }
    }
}

impl Finder for FrozenFinder {
    fn name(&self) -> &'static str {
        "frozen"
    }

    fn locate(&self, request: &LocateRequest<'_>) -> Option<ModuleSpec> {
        let key: Arc<str> = match request.probe {
            Probe::Archive => Arc::clone(&request.canonical),
            Probe::Frozen(prefix) => format!("{}.{}", prefix, request.leaf).into(),
            Probe::Dir(_) => return None,
        };
        let entry = self.archive.get(&key)?;

        match entry.kind() {
            EntryKind::Module => Some(ModuleSpec {
                name: Arc::clone(&request.canonical),
                origin: ModuleOrigin::Frozen { entry: key },
                is_package: false,
                locations: None,
            }),
            // Regular packages carry their init payload; namespace
            // portions are assembled by the namespace resolver, not
            // claimed here.
            EntryKind::Package if !entry.is_namespace() => Some(ModuleSpec {
                name: Arc::clone(&request.canonical),
                origin: ModuleOrigin::Frozen {
                    entry: Arc::clone(&key),
                },
                is_package: true,
                locations: Some(vec![Location::Frozen(key)]),
            }),
            _ => None,
        }
    }

    fn execute(
        &self,
        spec: &ModuleSpec,
        module: &Arc<ModuleObject>,
        resolver: &ImportResolver,
    ) -> Result<(), ImportError> {
        let ModuleOrigin::Frozen { entry } = &spec.origin else {
            return Ok(());
        };
        let entry = self
            .archive
            .get(entry)
            .ok_or_else(|| ImportError::NotFound {
                name: Arc::clone(&spec.name),
            })?;

        resolver
            .host()
            .execute(entry.data(), module, resolver)
            .map_err(|source| ImportError::ExecutionFailed {
                module: module.name_arc(),
                source,
            })
    }
}
