// ABOUTME: Read-only query handlers: check a value or hash, count keys, and dump the store.
// ABOUTME: None of these record an observation.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use timespotter_core::OccurrenceKey;

use crate::api::{bad_request, found_body, not_found, ok};
use crate::app_state::SharedState;

fn check(state: &SharedState, key: OccurrenceKey) -> Response {
    match state.store.lookup(&key) {
        Some(record) => ok(found_body(&key, &record)),
        None => not_found(),
    }
}

/// GET /check/value/{value} - Look up the digest of a raw value.
pub async fn check_value(State(state): State<SharedState>, Path(value): Path<String>) -> Response {
    check(&state, OccurrenceKey::digest(value))
}

/// GET /check/hash/{value} - Look up a 64-character hex digest.
pub async fn check_hash(State(state): State<SharedState>, Path(value): Path<String>) -> Response {
    match OccurrenceKey::from_hex(&value) {
        Ok(key) => check(&state, key),
        Err(e) => bad_request(format!("error decoding hash: {e}")),
    }
}

/// GET /info - Number of stored keys.
pub async fn info(State(state): State<SharedState>) -> Response {
    ok(json!({ "status": "OK", "keys": state.store.count().to_string() }))
}

/// GET /dump - Every entry as `hex,first,last,count`, one per line. The
/// store stays locked while the body is built.
pub async fn dump(State(state): State<SharedState>) -> Response {
    let body: String = {
        let dump = state.store.dump();
        dump.iter()
            .map(|(key, r)| format!("{key},{},{},{}\n", r.first, r.last, r.count))
            .collect()
    };
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}
