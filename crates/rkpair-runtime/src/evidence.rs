#![forbid(unsafe_code)]

//! Bounded FIFO ledger used as an audit trail for solver decisions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Bounded FIFO buffer of audit records.
///
/// Capacity is enforced via `capacity.max(1)`. When full, the oldest entry
/// (front of the `VecDeque`) is evicted before a new entry is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLedger<T> {
    capacity: usize,
    entries: VecDeque<T>,
    total_recorded: u64,
}

impl<T> EvidenceLedger<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            total_recorded: 0,
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn record(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total_recorded += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently recorded entry.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries ever recorded, including evicted ones.
    #[must_use]
    pub const fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Serialize> EvidenceLedger<T> {
    /// Serialize every retained entry as one JSON object per line.
    #[must_use]
    pub fn to_json_lines(&self) -> String {
        self.entries
            .iter()
            .map(|entry| serde_json::to_string(entry).unwrap_or_else(|_| String::from("{}")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
