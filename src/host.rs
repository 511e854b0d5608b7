//! Execution seam between the import machinery and the host runtime.
//!
//! The import machinery locates payloads; the host runtime (the VM)
//! executes them. The host receives the module object as the sole
//! execution context and may call back into the resolver for nested
//! imports — the resolver holds no locks across `execute`.
//!
//! The host serializes import execution per name (reentrant on one
//! thread, mutually exclusive across threads for the same name), so
//! implementations need no additional locking for module bodies.

use crate::error::HostError;
use crate::finder::ImportResolver;
use crate::module::ModuleObject;
use std::sync::Arc;

/// Executes module payloads on behalf of the import machinery.
pub trait CodeHost: Send + Sync {
    /// Execute `code` with `module` as the execution context.
    ///
    /// Errors propagate unmodified through the import machinery as the
    /// cause of `ImportError::ExecutionFailed`.
    fn execute(
        &self,
        code: &[u8],
        module: &Arc<ModuleObject>,
        resolver: &ImportResolver,
    ) -> Result<(), HostError>;
}

/// Host that treats every payload as a no-op.
///
/// Useful for resolution-only consumers (and as the default for tools
/// that inspect bundles without running them).
#[derive(Debug, Default)]
pub struct NullHost;

impl CodeHost for NullHost {
    fn execute(
        &self,
        _code: &[u8],
        _module: &Arc<ModuleObject>,
        _resolver: &ImportResolver,
    ) -> Result<(), HostError> {
        Ok(())
    }
}
