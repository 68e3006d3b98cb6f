//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;

use crate::Error;

/// The number of bytes of a body to log at the `info` level.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body accepted, 1 MiB.
pub const MAX_REQUEST_BODY_SIZE: usize = 1 << 20;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
///
/// Request bodies larger than [MAX_REQUEST_BODY_SIZE] are rejected with
/// [Error::PayloadTooLarge]. The bytes handed to the next handler are the
/// bytes the client sent; only the logged copy is decoded lossily.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(error) => {
            let error = error.into_inner();
            if error.is::<LengthLimitError>() {
                tracing::warn!(
                    "Rejected {} {}: body exceeds {MAX_REQUEST_BODY_SIZE} bytes",
                    parts.method,
                    parts.uri
                );
                return Error::PayloadTooLarge.into_response();
            }

            tracing::warn!("Could not read the request body: {error}");
            return Error::InvalidRequestBody.into_response();
        }
    };

    log_request(&parts, &body_for_log(&bytes));

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read the response body: {error}");
            return Response::from_parts(parts, Body::empty());
        }
    };

    log_response(&parts, &body_for_log(&bytes));

    Response::from_parts(parts, Body::from(bytes))
}

fn body_for_log(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Get the longest prefix of `body` that fits in [LOG_BODY_LENGTH_LIMIT]
/// bytes without splitting a character.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    let method = &parts.method;
    let uri = &parts.uri;

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {method} {uri} {:?}\nbody: {:}...",
            parts.headers,
            truncate_body(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {method} {uri} {:?}\nbody: {body:?}",
            parts.headers
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    let status = parts.status;

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {status} {:?}\nbody: {:}...",
            parts.headers,
            truncate_body(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {status} {:?}\nbody: {body:?}", parts.headers);
    }
}
