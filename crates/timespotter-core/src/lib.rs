// ABOUTME: Core types for timespotter: digest keys, occurrence records, and the occurrence store.
// ABOUTME: Every store operation serializes through a single internal lock.

pub mod key;
pub mod record;
pub mod store;

pub use key::{KeyError, OccurrenceKey};
pub use record::{OccurrenceRecord, RecordField};
pub use store::{Dump, OccurrenceStore, Override};
