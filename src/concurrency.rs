//! Per-unit reload serialization
//!
//! The registry never holds its table lock across a loader call. To keep the loader
//! from running twice at once for the same unit, each reload takes that unit's lock
//! for the whole load, commit and notify sequence, so observers of one unit see reloads
//! in commit order. Reloads of different units don't contend.
//!
//! The lock is reentrant: an observer running on the reloading thread may reload the
//! same unit again without deadlocking.
//!
//! Locks outlive unregistration so that a unit re-registered under the same name still
//! shares one lock with any reload of the previous incarnation that is in flight.

use parking_lot::{ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-unit lock manager for reload sequencing
pub struct UnitLockManager {
    /// Map from unit name to its reload lock
    locks: RwLock<HashMap<String, Arc<ReentrantMutex<()>>>>,
}

impl UnitLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the reload lock for a unit
    pub fn get_lock(&self, name: &str) -> Arc<ReentrantMutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(name) {
                return Arc::clone(lock);
            }
        }

        let mut map = self.locks.write();
        // Another thread may have inserted it between the two guards
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UnitLockManager {
    fn default() -> Self {
        Self::new()
    }
}
