//! Watch daemon and runtime logic.

use super::events::{ChangeEvent, EventBatcher};
use crate::config::WatchSettings;
use crate::error::ApiError;
use crate::registry::Registry;
use crate::types::ReloadRecord;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Maps a newly created path to the unit name it should be registered under.
pub type UnitNamer = Box<dyn Fn(&Path) -> Option<String> + Send + Sync>;

/// Watches a directory and reloads the units sourced from changed files.
pub struct WatchDaemon<H: ?Sized + Send + Sync + 'static> {
    registry: Arc<Registry<H>>,
    root: PathBuf,
    settings: WatchSettings,
    running: Arc<AtomicBool>,
    namer: Option<UnitNamer>,
}

impl<H: ?Sized + Send + Sync + 'static> WatchDaemon<H> {
    pub fn new(registry: Arc<Registry<H>>, root: PathBuf, settings: WatchSettings) -> Self {
        Self {
            registry,
            root,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            namer: None,
        }
    }

    /// Register units for files that appear while watching.
    pub fn with_namer(mut self, namer: UnitNamer) -> Self {
        self.namer = Some(namer);
        self
    }

    /// Shared flag; storing `false` stops a running daemon after its current wait.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Start watching. Blocks until [`WatchDaemon::stop`] is called or the watcher disconnects.
    pub fn start(&self) -> Result<(), ApiError> {
        self.running.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        info!(root = ?self.root, "Watching unit sources");

        let mut batcher = EventBatcher::new(self.settings.clone());
        let batch_window = Duration::from_millis(self.settings.batch_window_ms);
        // Wake up regularly even when idle so a stop request is noticed
        let poll_ceiling = Duration::from_millis(250);
        let mut last_batch_time = Instant::now();

        while self.is_running() {
            let timeout = batch_window
                .saturating_sub(last_batch_time.elapsed())
                .max(Duration::from_millis(1))
                .min(poll_ceiling);

            match rx.recv_timeout(timeout) {
                Ok(Ok(event)) => {
                    if let Some(change) = convert_event(event) {
                        debug!(kind = change.kind(), path = ?change.path(), "Change event");
                        if batcher.add_event(change, Instant::now()) {
                            self.process_batch(&batcher.take_batch());
                            last_batch_time = Instant::now();
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!("Watch error: {}", e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watcher channel disconnected");
                    break;
                }
            }

            if !batcher.is_empty() && last_batch_time.elapsed() >= batch_window {
                self.process_batch(&batcher.take_batch());
                last_batch_time = Instant::now();
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(root = ?self.root, "Watch stopped");
        Ok(())
    }

    /// Reload every unit sourced from `paths`; register new files when a namer is set.
    pub fn process_batch(&self, paths: &[PathBuf]) -> Vec<ReloadRecord> {
        if paths.is_empty() {
            return Vec::new();
        }

        let mut records = Vec::new();
        for path in paths {
            let reloaded = self.registry.reload_by_path(path);
            if reloaded.is_empty() {
                self.register_new(path);
            }
            records.extend(reloaded);
        }

        let failed = records.iter().filter(|r| !r.success).count();
        info!(
            paths = paths.len(),
            reloaded = records.len() - failed,
            failed,
            "Processed change batch"
        );
        records
    }

    fn register_new(&self, path: &Path) {
        let Some(namer) = &self.namer else {
            return;
        };
        if !path.is_file() {
            return;
        }
        let Some(name) = namer(path) else {
            return;
        };
        match self.registry.register_with_source(&name, Some(path.to_path_buf())) {
            Ok(true) => info!(unit = %name, path = ?path, "Registered new unit"),
            Ok(false) => {}
            Err(e) => warn!(unit = %name, error = %e, "New unit failed to load"),
        }
    }
}

fn convert_event(event: Event) -> Option<ChangeEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.first().map(|p| ChangeEvent::Created(p.clone())),
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
            if event.paths.len() >= 2 {
                Some(ChangeEvent::Renamed {
                    from: event.paths[0].clone(),
                    to: event.paths[1].clone(),
                })
            } else {
                event
                    .paths
                    .first()
                    .map(|p| ChangeEvent::Modified(p.clone()))
            }
        }
        EventKind::Modify(_) => event
            .paths
            .first()
            .map(|p| ChangeEvent::Modified(p.clone())),
        EventKind::Remove(_) => event.paths.first().map(|p| ChangeEvent::Removed(p.clone())),
        _ => None,
    }
}
