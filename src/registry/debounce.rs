//! Per-unit minimum-interval gate against reload storms.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Last attempt time per unit, plus the interval that must elapse between attempts.
///
/// Not synchronized: the registry evaluates the gate under its state lock so that
/// the check and the update happen as one step.
#[derive(Debug)]
pub struct DebounceGate {
    interval: Duration,
    last_attempt: HashMap<String, Instant>,
}

impl DebounceGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether an attempt at `now` falls inside the window of the previous one.
    pub fn is_debounced(&self, name: &str, now: Instant) -> bool {
        match self.last_attempt.get(name) {
            Some(last) => now.saturating_duration_since(*last) < self.interval,
            None => false,
        }
    }

    /// Allow or deny an attempt. Allowed attempts (forced or not) become the new
    /// baseline; denied ones leave the state untouched.
    pub fn check_and_record(&mut self, name: &str, now: Instant, force: bool) -> bool {
        if !force && self.is_debounced(name, now) {
            return false;
        }
        self.record(name, now);
        true
    }

    pub fn record(&mut self, name: &str, now: Instant) {
        self.last_attempt.insert(name.to_string(), now);
    }

    pub fn clear(&mut self, name: &str) {
        self.last_attempt.remove(name);
    }

    pub fn len(&self) -> usize {
        self.last_attempt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_attempt.is_empty()
    }
}
