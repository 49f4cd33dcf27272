//! Hot-reload registry
//!
//! Owns the table of loaded units and sequences every registration and reload.
//! A single state lock guards the unit table, the debounce gate and the history log
//! as one consistency unit. The lock is taken twice per reload (gate check, then
//! commit) and is never held across a loader call or a callback.

pub mod callbacks;
pub mod debounce;
pub mod history;

pub use callbacks::{CallbackDispatcher, ReloadCallback};
pub use debounce::DebounceGate;
pub use history::{HistoryLog, DEFAULT_HISTORY_CAPACITY};

use crate::concurrency::UnitLockManager;
use crate::config::RegistryConfig;
use crate::error::ReloadError;
use crate::loader::{CanonicalResolver, PathResolver, UnitLoader};
use crate::types::{RecordErrorKind, RegistryStatus, ReloadRecord, UnitStatus};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One loaded unit.
struct UnitEntry<H: ?Sized> {
    handle: Arc<H>,
    source_location: Option<PathBuf>,
    registered_at: DateTime<Utc>,
    last_reloaded_at: Option<DateTime<Utc>>,
    reload_count: u64,
    /// Distinguishes re-registrations under the same name, so a reload that
    /// started against a previous incarnation never commits into a new one.
    generation: u64,
}

struct RegistryState<H: ?Sized> {
    units: HashMap<String, UnitEntry<H>>,
    debounce: DebounceGate,
    history: HistoryLog,
    next_generation: u64,
}

/// Concurrent registry of hot-reloadable units.
///
/// `H` is the handle type produced by the loader. It may be unsized, so trait
/// objects (`Registry<dyn Plugin>`) work as handles.
pub struct Registry<H: ?Sized + Send + Sync + 'static> {
    loader: RwLock<Arc<dyn UnitLoader<H>>>,
    resolver: Box<dyn PathResolver>,
    state: Mutex<RegistryState<H>>,
    unit_locks: UnitLockManager,
    callbacks: CallbackDispatcher,
    config: RegistryConfig,
}

impl<H: ?Sized + Send + Sync + 'static> Registry<H> {
    pub fn new(loader: impl UnitLoader<H> + 'static, config: RegistryConfig) -> Self {
        Self {
            loader: RwLock::new(Arc::new(loader)),
            resolver: Box::new(CanonicalResolver),
            state: Mutex::new(RegistryState {
                units: HashMap::new(),
                debounce: DebounceGate::new(config.debounce_interval()),
                history: HistoryLog::with_capacity(config.history_capacity),
                next_generation: 0,
            }),
            unit_locks: UnitLockManager::new(),
            callbacks: CallbackDispatcher::new(),
            config,
        }
    }

    pub fn with_defaults(loader: impl UnitLoader<H> + 'static) -> Self {
        Self::new(loader, RegistryConfig::default())
    }

    /// Replace the path resolver used by [`Registry::reload_by_path`].
    pub fn with_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Swap the loader used by subsequent loads. In-flight loads finish with the old one.
    pub fn set_loader(&self, loader: impl UnitLoader<H> + 'static) {
        *self.loader.write() = Arc::new(loader);
    }

    fn current_loader(&self) -> Arc<dyn UnitLoader<H>> {
        Arc::clone(&self.loader.read())
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Load and register `name`, taking its source location from the loader.
    ///
    /// Returns `Ok(true)` when the unit was loaded now and `Ok(false)` when it was
    /// already registered (no load happens in that case).
    pub fn register(&self, name: &str) -> Result<bool, ReloadError> {
        self.register_with_source(name, None)
    }

    /// Like [`Registry::register`], with an explicit source location.
    pub fn register_with_source(
        &self,
        name: &str,
        source_location: Option<PathBuf>,
    ) -> Result<bool, ReloadError> {
        if self.contains(name) {
            return Ok(false);
        }

        let unit_lock = self.unit_locks.get_lock(name);
        let _guard = unit_lock.lock();
        if self.contains(name) {
            return Ok(false);
        }

        let loader = self.current_loader();
        let handle = loader.load(name).map_err(|e| {
            warn!(unit = %name, error = %e, "Failed to register unit");
            ReloadError::Load(e)
        })?;
        let source_location = source_location.or_else(|| loader.locate(name));

        let mut state = self.state.lock();
        let generation = state.next_generation;
        state.next_generation += 1;
        state.units.insert(
            name.to_string(),
            UnitEntry {
                handle,
                source_location: source_location.clone(),
                registered_at: Utc::now(),
                last_reloaded_at: None,
                reload_count: 0,
                generation,
            },
        );
        drop(state);

        info!(unit = %name, source = ?source_location, "Registered unit");
        Ok(true)
    }

    /// Remove `name` and its debounce state. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        state.debounce.clear(name);
        let removed = state.units.remove(name).is_some();
        drop(state);

        if removed {
            info!(unit = %name, "Unregistered unit");
        }
        removed
    }

    // ------------------------------------------------------------------
    // Reload
    // ------------------------------------------------------------------

    /// Reload `name`. Never fails past its boundary: every outcome is a record.
    ///
    /// Debounced and not-registered outcomes are returned but not added to history.
    /// Load outcomes are committed, appended to history and dispatched to callbacks
    /// before this returns.
    pub fn reload(&self, name: &str, force: bool) -> ReloadRecord {
        let requested_at = Instant::now();
        let generation = {
            let mut state = self.state.lock();
            // Unregistering clears debounce state, so an unknown name can never be
            // debounced and checking existence first is indistinguishable.
            let generation = match state.units.get(name) {
                Some(entry) => entry.generation,
                None => {
                    debug!(unit = %name, "Reload requested for unregistered unit");
                    return ReloadRecord::rejected(
                        name,
                        &ReloadError::NotRegistered(name.to_string()),
                    );
                }
            };
            if !state.debounce.check_and_record(name, requested_at, force) {
                debug!(unit = %name, "Reload debounced");
                return ReloadRecord::rejected(name, &ReloadError::Debounced(name.to_string()));
            }
            generation
        };

        let unit_lock = self.unit_locks.get_lock(name);
        let reload_guard = unit_lock.lock();

        let loader = self.current_loader();
        let started = Instant::now();
        let result = loader.load(name);
        let duration_ms = started.elapsed().as_millis() as u64;

        let record = {
            let mut state_guard = self.state.lock();
            let state = &mut *state_guard;
            let entry = match state.units.get_mut(name) {
                Some(entry) if entry.generation == generation => entry,
                _ => {
                    debug!(unit = %name, "Unit left the registry during reload, discarding result");
                    return ReloadRecord::rejected(
                        name,
                        &ReloadError::NotRegistered(name.to_string()),
                    );
                }
            };

            let record = match result {
                Ok(handle) => {
                    let record = ReloadRecord::succeeded(name, duration_ms);
                    entry.handle = handle;
                    entry.last_reloaded_at = Some(record.timestamp);
                    entry.reload_count += 1;
                    record
                }
                Err(message) => ReloadRecord::failed(name, message, duration_ms),
            };
            state.history.append(record.clone());
            state.debounce.record(name, Instant::now());
            record
        };

        if record.success {
            info!(unit = %name, duration_ms, force, "Reloaded unit");
        } else {
            warn!(
                unit = %name,
                duration_ms,
                error = record.error.as_deref().unwrap_or_default(),
                "Reload failed, keeping previous handle"
            );
        }

        // Still under the unit lock, so observers of one unit see commit order
        self.callbacks
            .dispatch(name, record.success, record.error.as_deref());
        drop(reload_guard);
        record
    }

    /// Reload every unit registered at call time, in name order.
    ///
    /// Units unregistered while the pass is running are skipped.
    pub fn reload_all(&self, force: bool) -> Vec<ReloadRecord> {
        let names = self.names();
        self.reload_each(&names, force)
    }

    /// Force-reload every unit whose source location resolves to the same path as `path`.
    pub fn reload_by_path(&self, path: &Path) -> Vec<ReloadRecord> {
        let names = self.units_for_path(path);
        if names.is_empty() {
            debug!(path = %path.display(), "No unit sourced from changed path");
        }
        self.reload_each(&names, true)
    }

    fn reload_each(&self, names: &[String], force: bool) -> Vec<ReloadRecord> {
        names
            .iter()
            .filter(|name| self.contains(name))
            .map(|name| self.reload(name, force))
            .filter(|record| record.error_kind() != Some(RecordErrorKind::NotRegistered))
            .collect()
    }

    /// Names of units whose resolved source location equals the resolved `path`.
    pub fn units_for_path(&self, path: &Path) -> Vec<String> {
        let sources: Vec<(String, PathBuf)> = {
            let state = self.state.lock();
            state
                .units
                .iter()
                .filter_map(|(name, entry)| {
                    entry
                        .source_location
                        .as_ref()
                        .map(|source| (name.clone(), source.clone()))
                })
                .collect()
        };

        // Resolution may touch the file system; keep it outside the state lock
        let target = self.resolver.resolve(path);
        let mut matches: Vec<String> = sources
            .into_iter()
            .filter(|(_, source)| self.resolver.resolve(source) == target)
            .map(|(name, _)| name)
            .collect();
        matches.sort();
        matches
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current handle of `name`: the last one that loaded successfully.
    pub fn get_handle(&self, name: &str) -> Option<Arc<H>> {
        let state = self.state.lock();
        state.units.get(name).map(|entry| Arc::clone(&entry.handle))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().units.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().units.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.state.lock().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> RegistryStatus {
        let state = self.state.lock();
        let units = state
            .units
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    UnitStatus {
                        registered_at: entry.registered_at,
                        last_reloaded_at: entry.last_reloaded_at,
                        reload_count: entry.reload_count,
                        source_location: entry.source_location.clone(),
                    },
                )
            })
            .collect();

        RegistryStatus {
            units,
            total_reloads: state.units.values().map(|e| e.reload_count).sum(),
            history_length: state.history.len(),
            last_history_at: state.history.last().map(|r| r.timestamp),
        }
    }

    /// Owned copy of the reload history, oldest first.
    pub fn history(&self) -> Vec<ReloadRecord> {
        self.state.lock().history.snapshot()
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register an observer for every reload attempt that reaches the loader.
    /// There is no way to remove an individual callback.
    pub fn on_reload(&self, callback: impl ReloadCallback + 'static) {
        self.callbacks.register(Arc::new(callback));
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }
}
