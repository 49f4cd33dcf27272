//! Change events and batching.

use crate::config::WatchSettings;
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Filesystem change event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    /// Path the event is keyed on (the destination for renames).
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }

    /// Every path whose unit may need reloading.
    pub fn affected_paths(&self) -> Vec<PathBuf> {
        match self {
            ChangeEvent::Renamed { from, to } => vec![from.clone(), to.clone()],
            other => vec![other.path().to_path_buf()],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Created(_) => "created",
            ChangeEvent::Modified(_) => "modified",
            ChangeEvent::Removed(_) => "removed",
            ChangeEvent::Renamed { .. } => "renamed",
        }
    }
}

/// Groups events per path, coalescing bursts that land inside the debounce window.
pub struct EventBatcher {
    settings: WatchSettings,
    ignore: Vec<Pattern>,
    pending: HashMap<PathBuf, ChangeEvent>,
    last_seen: HashMap<PathBuf, Instant>,
}

impl EventBatcher {
    /// Patterns that fail to compile are skipped; [`WatchSettings::validate`] reports them.
    pub fn new(settings: WatchSettings) -> Self {
        let ignore = settings
            .ignore_patterns
            .iter()
            .filter_map(|pattern| Pattern::new(&pattern.replace('\\', "/")).ok())
            .collect();
        Self {
            settings,
            ignore,
            pending: HashMap::new(),
            last_seen: HashMap::new(),
        }
    }

    /// Queue an event observed at `now`. Returns true once the batch is full.
    pub fn add_event(&mut self, event: ChangeEvent, now: Instant) -> bool {
        if self.should_ignore(event.path()) {
            return false;
        }

        let path = event.path().to_path_buf();
        let window = Duration::from_millis(self.settings.debounce_ms);
        let in_window = self
            .last_seen
            .get(&path)
            .map(|last| now.saturating_duration_since(*last) < window)
            .unwrap_or(false);

        // A burst keeps its first timestamp, so a steady stream still flushes
        if !in_window {
            self.last_seen.insert(path.clone(), now);
        }
        self.pending.insert(path, event);

        self.pending.len() >= self.settings.max_batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drain pending events into a sorted, de-duplicated set of affected paths.
    pub fn take_batch(&mut self) -> Vec<PathBuf> {
        let events: Vec<ChangeEvent> = self.pending.drain().map(|(_, event)| event).collect();
        self.last_seen.clear();

        // Editors often save via a temp file renamed into place; drop the ignored side
        let paths: BTreeSet<PathBuf> = events
            .iter()
            .flat_map(ChangeEvent::affected_paths)
            .filter(|p| !self.should_ignore(p))
            .collect();
        paths.into_iter().collect()
    }

    fn should_ignore(&self, path: &Path) -> bool {
        let path = path.to_string_lossy().replace('\\', "/");
        self.ignore
            .iter()
            .any(|pattern| pattern.matches_with(&path, SEGMENT_MATCH))
    }
}

const SEGMENT_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};
