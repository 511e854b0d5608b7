//! The filesystem finder: serves modules from loose source files.
//!
//! This is the host runtime's ordinary directory-scanning finder,
//! present so that externally supplied directories keep working inside
//! a frozen application. It answers directory probes only — search
//! path entries for top-level names, the parent's recorded directory
//! roots for submodules. A directory containing an `__init__.py` is a
//! regular package; a bare `<name>.py` file is a module.

use crate::error::ImportError;
use crate::finder::{Finder, ImportResolver, LocateRequest, ModuleSpec, Probe};
use crate::module::{ModuleObject, ModuleOrigin};
use crate::nspath::Location;
use std::sync::Arc;

const INIT_FILE: &str = "__init__.py";
const SOURCE_SUFFIX: &str = "py";

/// Filesystem-backed import-path participant.
#[derive(Debug, Default)]
pub struct PathFinder;

impl PathFinder {
    pub fn new() -> Self {
        Self
    }
}

impl Finder for PathFinder {
    fn name(&self) -> &'static str {
        "path"
    }

    fn locate(&self, request: &LocateRequest<'_>) -> Option<ModuleSpec> {
        let Probe::Dir(dir) = request.probe else {
            return None;
        };

        let package_dir = dir.join(request.leaf);
        let init = package_dir.join(INIT_FILE);
        if init.is_file() {
            return Some(ModuleSpec {
                name: Arc::clone(&request.canonical),
                origin: ModuleOrigin::Source { path: init },
                is_package: true,
                locations: Some(vec![Location::Dir(package_dir)]),
            });
        }

        let file = dir.join(format!("{}.{}", request.leaf, SOURCE_SUFFIX));
        if file.is_file() {
            return Some(ModuleSpec {
                name: Arc::clone(&request.canonical),
                origin: ModuleOrigin::Source { path: file },
                is_package: false,
                locations: None,
            });
        }
        None
    }

    fn execute(
        &self,
        spec: &ModuleSpec,
        module: &Arc<ModuleObject>,
        resolver: &ImportResolver,
    ) -> Result<(), ImportError> {
        let ModuleOrigin::Source { path } = &spec.origin else {
            return Ok(());
        };
        let code = std::fs::read(path).map_err(|source| ImportError::SourceRead {
            module: module.name_arc(),
            path: path.clone(),
            source,
        })?;

        resolver
            .host()
            .execute(&code, module, resolver)
            .map_err(|source| ImportError::ExecutionFailed {
                module: module.name_arc(),
                source,
            })
    }
}
