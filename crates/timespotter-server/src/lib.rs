// ABOUTME: HTTP command API for timespotter.
// ABOUTME: Uses Axum with a shared OccurrenceStore and the configured snapshot path.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, ServerConfig};
pub use routes::create_router;
