use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::models::{AnswerResult, QueryMode, QueryRequest, QuerySubtype};

/// Number of answered queries kept per session
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub query: String,
    pub mode: QueryMode,
    pub subtype: QuerySubtype,
    pub timestamp: DateTime<Local>,
    pub result: AnswerResult,
}

impl HistoryEntry {
    pub fn new(request: &QueryRequest, result: AnswerResult) -> Self {
        Self::at(request, result, Local::now())
    }

    pub fn at(request: &QueryRequest, result: AnswerResult, timestamp: DateTime<Local>) -> Self {
        Self {
            query: request.text.clone(),
            mode: request.mode,
            subtype: request.subtype,
            timestamp,
            result,
        }
    }
}

/// Bounded, most-recent-first log of answered queries.
///
/// Lives only as long as the owning client; nothing is written to disk.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Clamped to `1..=DEFAULT_HISTORY_CAPACITY`; a session never holds more than five answers
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, DEFAULT_HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                tracing::debug!(target: "history", "Evicted oldest entry: {}", evicted.query);
            }
        }
    }

    pub fn clear(&mut self) {
        tracing::debug!(target: "history", "Clearing {} entries", self.entries.len());
        self.entries.clear();
    }

    /// Entries ordered most-recent-first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}
