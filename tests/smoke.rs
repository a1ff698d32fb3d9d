// ABOUTME: End-to-end smoke test for the full timespotter lifecycle.
// ABOUTME: Drives the HTTP command API, the DNS answer path and the snapshot file against one shared store.

use std::sync::Arc;

use axum::body::Body;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use http::Request;
use timespotter_core::{OccurrenceKey, OccurrenceStore};
use timespotter_server::{AppState, create_router};
use timespotter_store::load_snapshot;
use tower::ServiceExt;

/// Helper to extract JSON body from a response.
async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn dns_query(key: &OccurrenceKey) -> Message {
    let hex = key.to_hex();
    let name = Name::from_ascii(format!("{}.{}.spot.test.", &hex[..32], &hex[32..])).unwrap();
    let mut msg = Message::new();
    msg.set_id(99)
        .set_message_type(MessageType::Query)
        .add_query(Query::query(name, RecordType::A));
    msg
}

#[tokio::test]
async fn smoke_test_full_lifecycle() {
    let dir = tempfile::TempDir::new().unwrap();
    let state_path = dir.path().join("timespotter.state");
    let store = Arc::new(OccurrenceStore::new());
    let state = Arc::new(AppState::new(Arc::clone(&store), state_path.clone()));
    let hello = OccurrenceKey::digest("hello");

    // 1. DNS miss before anything is observed
    let resp = timespotter_dns::answer(&store, &dns_query(&hello));
    assert_eq!(resp.response_code(), ResponseCode::ServFail);

    // 2. POST /seen/value/hello
    let app = create_router(Arc::clone(&state));
    let resp = app
        .oneshot(Request::post("/seen/value/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = json_body(resp).await;
    assert_eq!(json["hash"], hello.to_hex());

    // 3. GET /check/value/hello
    let app = create_router(Arc::clone(&state));
    let resp = app
        .oneshot(Request::get("/check/value/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = json_body(resp).await;
    assert_eq!(json["found"], true);
    assert_eq!(json["count"], "1");

    // 4. DNS hit now that the key is known
    let resp = timespotter_dns::answer(&store, &dns_query(&hello));
    assert_eq!(resp.response_code(), ResponseCode::NoError);
    assert_eq!(resp.answers().len(), 1);
    assert_eq!(resp.answers()[0].ttl(), 0);

    // 5. POST /post/hash with one valid and one malformed line
    let valid = OccurrenceKey::digest("world").to_hex();
    let app = create_router(Arc::clone(&state));
    let resp = app
        .oneshot(
            Request::post("/post/hash")
                .body(Body::from(format!("{valid}\nnot-hex\n")))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(resp).await;
    assert_eq!(json["added"], "2");
    assert_eq!(store.count(), 2);

    // 6. POST /save, then wipe a key and reload from disk
    let app = create_router(Arc::clone(&state));
    let resp = app
        .oneshot(Request::post("/save").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(state_path.exists());

    let restored = OccurrenceStore::new();
    assert_eq!(load_snapshot(&restored, &state_path).unwrap(), 2);
    assert_eq!(restored.lookup(&hello), store.lookup(&hello));

    // 7. POST /unseen/value/hello, DNS misses again
    let app = create_router(Arc::clone(&state));
    let resp = app
        .oneshot(Request::post("/unseen/value/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let resp = timespotter_dns::answer(&store, &dns_query(&hello));
    assert_eq!(resp.response_code(), ResponseCode::ServFail);

    // 8. GET /info reflects the remaining key
    let app = create_router(Arc::clone(&state));
    let resp = app
        .oneshot(Request::get("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(resp).await;
    assert_eq!(json["keys"], "1");
}
