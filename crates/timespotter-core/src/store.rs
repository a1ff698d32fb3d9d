// ABOUTME: OccurrenceStore, the concurrent key -> record map behind both query surfaces.
// ABOUTME: One mutex guards every read, write, full scan and snapshot operation end-to-end.

use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::key::OccurrenceKey;
use crate::record::{OccurrenceRecord, RecordField};

type Entries = HashMap<OccurrenceKey, OccurrenceRecord>;

/// Current time in whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// The previous and resulting record of a field override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Override {
    pub old: OccurrenceRecord,
    pub new: OccurrenceRecord,
}

/// Records when each key was first and last observed and how often.
///
/// All operations lock internally; callers never hold the lock themselves.
/// Full scans (`dump`, `expire_by`) and snapshot replacement keep the lock
/// for their whole duration, stalling every other caller meanwhile.
#[derive(Debug, Default)]
pub struct OccurrenceStore {
    entries: Mutex<Entries>,
}

impl OccurrenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // Each mutation is a single map operation, so a panicking holder can
    // never leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an observation of `key` at the current time.
    pub fn record_seen(&self, key: OccurrenceKey) -> OccurrenceRecord {
        self.record_seen_at(key, unix_now())
    }

    /// Record an observation of `key` at `now`. A new key starts at
    /// `{first = last = now, count = 1}`; a known key gets `last = now` and
    /// its count incremented.
    pub fn record_seen_at(&self, key: OccurrenceKey, now: u64) -> OccurrenceRecord {
        let mut entries = self.lock();
        observe(&mut entries, key, now)
    }

    /// Record a batch of observations under one lock acquisition.
    ///
    /// `None` marks an element the caller could not decode: it is skipped but
    /// still counted, so the returned value is always the number of elements
    /// iterated. Nothing is rolled back.
    pub fn record_seen_batch<I>(&self, keys: I) -> u64
    where
        I: IntoIterator<Item = Option<OccurrenceKey>>,
    {
        self.record_seen_batch_at(keys, unix_now())
    }

    /// Like [`record_seen_batch`](Self::record_seen_batch) with an explicit timestamp.
    pub fn record_seen_batch_at<I>(&self, keys: I, now: u64) -> u64
    where
        I: IntoIterator<Item = Option<OccurrenceKey>>,
    {
        let mut entries = self.lock();
        let mut applied = 0u64;
        for key in keys {
            if let Some(key) = key {
                observe(&mut entries, key, now);
            }
            applied += 1;
        }
        applied
    }

    /// Remove `key` if present. Returns whether it was present.
    pub fn forget(&self, key: &OccurrenceKey) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn lookup(&self, key: &OccurrenceKey) -> Option<OccurrenceRecord> {
        self.lock().get(key).copied()
    }

    /// Return the first of `keys` that is not stored, checking all of them
    /// under one lock acquisition.
    pub fn find_unseen<'k, I>(&self, keys: I) -> Option<OccurrenceKey>
    where
        I: IntoIterator<Item = &'k OccurrenceKey>,
    {
        let entries = self.lock();
        keys.into_iter().find(|key| !entries.contains_key(*key)).copied()
    }

    /// Number of stored keys.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Lock the store and enumerate it. The lock is released when the
    /// returned guard is dropped.
    pub fn dump(&self) -> Dump<'_> {
        Dump { guard: self.lock() }
    }

    /// Remove every entry whose `field` is strictly greater than `threshold`
    /// and return how many were removed. A negative threshold removes
    /// everything.
    ///
    /// Note the direction: this purges entries *newer* than the cutoff.
    pub fn expire_by(&self, field: RecordField, threshold: i64) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        match u64::try_from(threshold) {
            Ok(limit) => entries.retain(|_, record| record.get(field) <= limit),
            Err(_) => entries.clear(),
        }
        let removed = before - entries.len();
        tracing::debug!(%field, threshold, removed, "expired entries");
        removed
    }

    /// Overwrite one field of an existing record without touching the others.
    /// No consistency between `first` and `last` is enforced.
    pub fn override_field(
        &self,
        key: &OccurrenceKey,
        field: RecordField,
        value: u64,
    ) -> Option<Override> {
        let mut entries = self.lock();
        let record = entries.get_mut(key)?;
        let old = *record;
        record.set(field, value);
        Some(Override { old, new: *record })
    }

    /// Replace the whole map with the result of `load`, which runs while the
    /// lock is held. On error the current contents are kept. Returns the new
    /// number of keys.
    pub fn replace_with<E>(&self, load: impl FnOnce() -> Result<Entries, E>) -> Result<usize, E> {
        let mut entries = self.lock();
        *entries = load()?;
        Ok(entries.len())
    }
}

fn observe(entries: &mut Entries, key: OccurrenceKey, now: u64) -> OccurrenceRecord {
    *entries
        .entry(key)
        .and_modify(|record| record.observe(now))
        .or_insert_with(|| OccurrenceRecord::first_seen(now))
}

/// A locked view over the whole store, produced by [`OccurrenceStore::dump`].
pub struct Dump<'a> {
    guard: MutexGuard<'a, Entries>,
}

impl Dump<'_> {
    pub fn iter(&self) -> hash_map::Iter<'_, OccurrenceKey, OccurrenceRecord> {
        self.guard.iter()
    }
}
