// ABOUTME: Administrative handlers: snapshot save/load, threshold expiry, and field overrides.
// ABOUTME: Snapshot I/O runs on the blocking pool while holding the store lock.

use axum::extract::{Path, State};
use axum::response::Response;
use serde_json::json;
use timespotter_core::{OccurrenceKey, RecordField};
use timespotter_store::{SnapshotError, load_snapshot, save_snapshot};

use crate::api::{bad_request, found_body, not_found, ok, ok_status, server_error};
use crate::app_state::SharedState;

/// Run a snapshot operation against the configured state file off the async runtime.
async fn run_snapshot<F>(state: SharedState, op: F) -> Result<usize, String>
where
    F: FnOnce(&SharedState) -> Result<usize, SnapshotError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || op(&state)).await {
        Ok(Ok(keys)) => Ok(keys),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("snapshot task failed: {e}")),
    }
}

/// POST /save - Write the store to the state file.
pub async fn save(State(state): State<SharedState>) -> Response {
    match run_snapshot(state, |s| save_snapshot(&s.store, &s.state_path)).await {
        Ok(_) => ok_status(),
        Err(e) => {
            tracing::error!("failed to save snapshot: {}", e);
            server_error(e)
        }
    }
}

/// POST /load - Replace the store with the contents of the state file.
pub async fn load(State(state): State<SharedState>) -> Response {
    match run_snapshot(state, |s| load_snapshot(&s.store, &s.state_path)).await {
        Ok(_) => ok_status(),
        Err(e) => {
            tracing::error!("failed to load snapshot: {}", e);
            server_error(e)
        }
    }
}

fn expire(state: &SharedState, field: RecordField, limit: &str) -> Response {
    let threshold: i64 = match limit.parse() {
        Ok(t) => t,
        Err(_) => return bad_request(format!("error decoding limit: {limit}")),
    };
    let expired = state.store.expire_by(field, threshold);
    tracing::info!(%field, threshold, expired, "expired entries");
    ok(json!({ "status": "OK", "expired": expired.to_string() }))
}

/// POST /expire/first/{limit} - Remove entries first seen after `limit`.
pub async fn expire_first(State(state): State<SharedState>, Path(limit): Path<String>) -> Response {
    expire(&state, RecordField::First, &limit)
}

/// POST /expire/last/{limit} - Remove entries last seen after `limit`.
pub async fn expire_last(State(state): State<SharedState>, Path(limit): Path<String>) -> Response {
    expire(&state, RecordField::Last, &limit)
}

fn override_field(state: &SharedState, field: RecordField, hash: &str, value: &str) -> Response {
    let key = match OccurrenceKey::from_hex(hash) {
        Ok(k) => k,
        Err(e) => return bad_request(format!("error decoding hash: {e}")),
    };
    let value: u64 = match value.parse() {
        Ok(v) => v,
        Err(_) => return bad_request(format!("error decoding {field}: {value}")),
    };

    match state.store.override_field(&key, field, value) {
        Some(change) => {
            let mut body = found_body(&key, &change.new);
            body[format!("old{field}")] = json!(change.old.get(field).to_string());
            ok(body)
        }
        None => not_found(),
    }
}

/// POST /override/first/{hash}/{time}
pub async fn override_first(
    State(state): State<SharedState>,
    Path((hash, time)): Path<(String, String)>,
) -> Response {
    override_field(&state, RecordField::First, &hash, &time)
}

/// POST /override/last/{hash}/{time}
pub async fn override_last(
    State(state): State<SharedState>,
    Path((hash, time)): Path<(String, String)>,
) -> Response {
    override_field(&state, RecordField::Last, &hash, &time)
}

/// POST /override/count/{hash}/{count}
pub async fn override_count(
    State(state): State<SharedState>,
    Path((hash, count)): Path<(String, String)>,
) -> Response {
    override_field(&state, RecordField::Count, &hash, &count)
}
