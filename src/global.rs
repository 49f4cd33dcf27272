//! Process-wide access to an explicitly constructed registry.
//!
//! ```rust,ignore
//! static UNITS: GlobalRegistry<FileUnit> = GlobalRegistry::new();
//!
//! UNITS.install(Arc::new(Registry::with_defaults(loader)))?;
//! let registry = UNITS.get().expect("installed at startup");
//! ```

use crate::registry::Registry;
use std::sync::{Arc, OnceLock};

/// Write-once slot holding the process registry.
pub struct GlobalRegistry<H: ?Sized + Send + Sync + 'static> {
    cell: OnceLock<Arc<Registry<H>>>,
}

impl<H: ?Sized + Send + Sync + 'static> GlobalRegistry<H> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Install `registry`. Hands it back if a registry was already installed.
    pub fn install(&self, registry: Arc<Registry<H>>) -> Result<(), Arc<Registry<H>>> {
        self.cell.set(registry)
    }

    pub fn get(&self) -> Option<Arc<Registry<H>>> {
        self.cell.get().cloned()
    }

    /// Return the installed registry, constructing it with `init` on first access.
    pub fn get_or_init(&self, init: impl FnOnce() -> Registry<H>) -> Arc<Registry<H>> {
        Arc::clone(self.cell.get_or_init(|| Arc::new(init())))
    }

    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<H: ?Sized + Send + Sync + 'static> Default for GlobalRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
