//! Bounded audit log of reload attempts.

use crate::types::ReloadRecord;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Insertion-ordered ring of [`ReloadRecord`]s. The oldest record is evicted first.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    records: VecDeque<ReloadRecord>,
    capacity: usize,
}

impl HistoryLog {
    /// Create a log holding at most `capacity` records. A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, record: ReloadRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Owned copy, oldest first.
    pub fn snapshot(&self) -> Vec<ReloadRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&ReloadRecord> {
        self.records.back()
    }

    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| !r.success).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}
