// ABOUTME: Persistence layer for timespotter.
// ABOUTME: Saves and loads the whole occurrence store as a compressed snapshot file.

pub mod snapshot;

pub use snapshot::{SnapshotError, check_writable, load_snapshot, save_snapshot};
