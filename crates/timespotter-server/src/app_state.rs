// ABOUTME: Shared application state for the timespotter HTTP server.
// ABOUTME: Holds the occurrence store shared with the DNS listener and the snapshot file path.

use std::path::PathBuf;
use std::sync::Arc;

use timespotter_core::OccurrenceStore;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub store: Arc<OccurrenceStore>,
    pub state_path: PathBuf,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create a new AppState around an existing store and snapshot path.
    pub fn new(store: Arc<OccurrenceStore>, state_path: PathBuf) -> Self {
        Self { store, state_path }
    }
}
