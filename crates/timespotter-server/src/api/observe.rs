// ABOUTME: Observation handlers: record or forget single values and hashes, and batch bodies.
// ABOUTME: Batch handlers report every counted line, including lines that were skipped.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use serde_json::json;
use timespotter_core::OccurrenceKey;

use crate::api::{bad_request, ok, ok_status};
use crate::app_state::SharedState;

fn seen(state: &SharedState, key: OccurrenceKey) -> Response {
    let record = state.store.record_seen(key);
    ok(json!({
        "status": "OK",
        "hash": key.to_hex(),
        "count": record.count.to_string(),
        "first": record.first.to_string(),
        "last": record.last.to_string(),
    }))
}

/// POST /seen/value/{value} - Hash a raw value and record an observation.
pub async fn seen_value(State(state): State<SharedState>, Path(value): Path<String>) -> Response {
    seen(&state, OccurrenceKey::digest(value))
}

/// POST /seen/hash/{value} and GET /linkspotter/{value} - Record an
/// observation of a 64-character hex digest.
pub async fn seen_hash(State(state): State<SharedState>, Path(value): Path<String>) -> Response {
    match OccurrenceKey::from_hex(&value) {
        Ok(key) => seen(&state, key),
        Err(e) => bad_request(format!("error decoding hash: {e}")),
    }
}

/// POST /post/value - Hash and record every line of the body.
///
/// Every `\n`-separated element is counted, empty ones included.
pub async fn post_values(State(state): State<SharedState>, body: Bytes) -> Response {
    let keys = body
        .split(|b| *b == b'\n')
        .map(|line| (!line.is_empty()).then(|| OccurrenceKey::digest(line)));
    let added = state.store.record_seen_batch(keys);
    tracing::info!(added, "added values to map");
    ok(json!({ "status": "OK", "added": added.to_string() }))
}

/// POST /post/hash - Record every hex digest line of the body.
///
/// Empty lines are ignored entirely. Lines that are not valid hex are
/// skipped but still counted.
pub async fn post_hashes(State(state): State<SharedState>, body: Bytes) -> Response {
    let keys = body
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| {
            std::str::from_utf8(line)
                .ok()
                .and_then(|s| OccurrenceKey::from_hex_prefix(s).ok())
        });
    let added = state.store.record_seen_batch(keys);
    tracing::info!(added, "added hashes to map");
    ok(json!({ "status": "OK", "added": added.to_string() }))
}

/// POST /unseen/value/{value} - Forget a raw value. Succeeds even if absent.
pub async fn unseen_value(State(state): State<SharedState>, Path(value): Path<String>) -> Response {
    state.store.forget(&OccurrenceKey::digest(value));
    ok_status()
}

/// POST /unseen/hash/{value} - Forget a hex digest. Succeeds even if absent.
pub async fn unseen_hash(State(state): State<SharedState>, Path(value): Path<String>) -> Response {
    match OccurrenceKey::from_hex(&value) {
        Ok(key) => {
            state.store.forget(&key);
            ok_status()
        }
        Err(e) => bad_request(format!("error decoding hash: {e}")),
    }
}
