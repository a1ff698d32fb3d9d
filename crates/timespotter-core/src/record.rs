// ABOUTME: OccurrenceRecord holds first-seen, last-seen and count for one key.
// ABOUTME: RecordField names the individually addressable fields used by expire and override.

use std::fmt;

/// Observation history for a single key. Timestamps are seconds since the
/// Unix epoch. A stored record always has `count >= 1` unless overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceRecord {
    pub first: u64,
    pub last: u64,
    pub count: u64,
}

impl OccurrenceRecord {
    /// A record for a key observed for the first time at `now`.
    pub fn first_seen(now: u64) -> Self {
        Self {
            first: now,
            last: now,
            count: 1,
        }
    }

    /// Register another observation at `now`. `first` is untouched.
    pub fn observe(&mut self, now: u64) {
        self.last = now;
        self.count = self.count.saturating_add(1);
    }

    pub fn get(&self, field: RecordField) -> u64 {
        match field {
            RecordField::First => self.first,
            RecordField::Last => self.last,
            RecordField::Count => self.count,
        }
    }

    pub fn set(&mut self, field: RecordField, value: u64) {
        match field {
            RecordField::First => self.first = value,
            RecordField::Last => self.last = value,
            RecordField::Count => self.count = value,
        }
    }
}

/// A single field of an [`OccurrenceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    First,
    Last,
    Count,
}

impl RecordField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::First => "first",
            RecordField::Last => "last",
            RecordField::Count => "count",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
