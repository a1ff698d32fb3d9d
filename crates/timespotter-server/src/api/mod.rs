// ABOUTME: API module containing all HTTP handler functions for the timespotter command API.
// ABOUTME: Shared response builders live here; handlers are split into observe, query and admin.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use timespotter_core::{OccurrenceKey, OccurrenceRecord};

pub mod admin;
pub mod observe;
pub mod query;

/// 200 with the given JSON body.
pub(crate) fn ok(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// 200 with `{"status": "OK"}`.
pub(crate) fn ok_status() -> Response {
    ok(json!({ "status": "OK" }))
}

/// 400 for undecodable path or body parameters. The store is untouched.
pub(crate) fn bad_request(error: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "ERROR", "error": error.to_string() })),
    )
        .into_response()
}

pub(crate) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "NOT FOUND", "found": false })),
    )
        .into_response()
}

pub(crate) fn server_error(error: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "ERROR", "error": error.to_string() })),
    )
        .into_response()
}

/// Record fields rendered the way every endpoint reports them: numbers as
/// strings, key as lowercase hex.
pub(crate) fn found_body(key: &OccurrenceKey, record: &OccurrenceRecord) -> Value {
    json!({
        "status": "OK",
        "found": true,
        "first": record.first.to_string(),
        "last": record.last.to_string(),
        "count": record.count.to_string(),
        "hash": key.to_hex(),
    })
}
