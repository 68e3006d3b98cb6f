use axum::{body::Body, http::StatusCode, response::Response};
use axum_test::TestServer;
use serde_json::Value;

use crate::{AppState, app_state::DEFAULT_REQUEST_TIMEOUT, build_router, db::Database};

/// App state backed by a fresh in-memory database.
pub(crate) fn get_test_state() -> AppState {
    let db = Database::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(db, DEFAULT_REQUEST_TIMEOUT)
}

/// A test server for the full router, including middleware.
pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}

pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    let content_type_header = response
        .headers()
        .get("content-type")
        .expect("content-type header missing");
    assert_eq!(content_type_header, content_type);
}

/// Check that `body` is an error envelope for `status` that blames `field`.
#[track_caller]
pub(crate) fn assert_error_field(body: &Value, status: StatusCode, field: &str) {
    assert_eq!(
        body["error"]["code"],
        status.canonical_reason().expect("status has no reason phrase"),
        "unexpected error code in {body}"
    );
    assert_eq!(
        body["error"]["details"]["field"], field,
        "unexpected error field in {body}"
    );
}
