//! Application router configuration.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::HeaderName,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    category::{create_category_endpoint, list_categories_endpoint},
    endpoints,
    health::get_health,
    logging::logging_middleware,
    register_user::register_user,
    summary::get_summary_endpoint,
    transaction::{create_transaction_endpoint, list_transactions_endpoint},
};

/// The header that carries the ID of a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Return a router with all the app's routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let router = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::CATEGORIES,
            post(create_category_endpoint).get(list_categories_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(list_transactions_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .with_state(state);

    // Layers wrap the ones added before them, so the request ID is set first
    // and is visible to the logging and tracing layers.
    add_tracing_layer(router.layer(middleware::from_fn(logging_middleware)))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}

/// Allow requests from any origin.
pub fn add_cors_layer(router: Router) -> Router {
    router.layer(CorsLayer::permissive())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok());

            tracing::debug_span!("request", %method, %uri, matched_path, request_id)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
