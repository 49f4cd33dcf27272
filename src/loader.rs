//! Unit loading and path resolution seams.
//!
//! The registry never materializes a unit itself. Hosts plug in a [`UnitLoader`] that
//! turns a logical name into a handle, and optionally a [`PathResolver`] used to match
//! file-system paths against unit source locations.

mod file;
mod resolve;

pub use file::{FileUnit, FileUnitLoader};
pub use resolve::{normalize_lexically, CanonicalResolver, PathResolver};

use std::path::PathBuf;
use std::sync::Arc;

/// Produces fresh handles for named units.
///
/// Must be safe to call concurrently for different names. The registry never issues
/// two concurrent calls for the same name.
pub trait UnitLoader<H: ?Sized>: Send + Sync {
    /// Load `name`, returning the new handle or a human-readable diagnostic.
    fn load(&self, name: &str) -> Result<Arc<H>, String>;

    /// Source location of `name`, used for path-based reloads.
    fn locate(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

impl<H, F> UnitLoader<H> for F
where
    H: ?Sized,
    F: Fn(&str) -> Result<Arc<H>, String> + Send + Sync,
{
    fn load(&self, name: &str) -> Result<Arc<H>, String> {
        self(name)
    }
}
