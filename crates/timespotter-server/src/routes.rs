// ABOUTME: Route definitions for the timespotter HTTP command API.
// ABOUTME: Assembles observation, query and admin routes into a single Axum Router with shared state.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/seen/value/{value}", post(api::observe::seen_value))
        .route("/seen/hash/{value}", post(api::observe::seen_hash))
        .route("/post/value", post(api::observe::post_values))
        .route("/post/hash", post(api::observe::post_hashes))
        .route("/unseen/value/{value}", post(api::observe::unseen_value))
        .route("/unseen/hash/{value}", post(api::observe::unseen_hash))
        // Link tracking: a GET that records an observation.
        .route("/linkspotter/{value}", get(api::observe::seen_hash))
        .route("/check/value/{value}", get(api::query::check_value))
        .route("/check/hash/{value}", get(api::query::check_hash))
        .route("/info", get(api::query::info))
        .route("/dump", get(api::query::dump))
        .route("/save", post(api::admin::save))
        .route("/load", post(api::admin::load))
        .route("/expire/first/{limit}", post(api::admin::expire_first))
        .route("/expire/last/{limit}", post(api::admin::expire_last))
        .route("/override/first/{hash}/{time}", post(api::admin::override_first))
        .route("/override/last/{hash}/{time}", post(api::admin::override_last))
        .route("/override/count/{hash}/{count}", post(api::admin::override_count))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
