//! The health check endpoint.

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, RequestContext, db::Database};

/// The state needed for the health check.
#[derive(Debug, Clone)]
pub struct HealthState {
    pub db: Database,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// Respond with 200 OK if the database answers a query, otherwise 503.
pub async fn get_health(State(state): State<HealthState>, context: RequestContext) -> Response {
    match state.db.ping(&context).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response(),
        Err(error) => {
            tracing::error!("Health check failed: {error}");

            let status = StatusCode::SERVICE_UNAVAILABLE;
            let body = json!({
                "error": {
                    "code": status.canonical_reason(),
                    "message": "Service unavailable",
                }
            });

            (status, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod health_tests {
    use axum::{extract::State, http::StatusCode};

    use crate::{
        RequestContext,
        db::Database,
        test_utils::{assert_content_type, parse_json_body},
    };

    use super::{HealthState, get_health};

    #[tokio::test]
    async fn healthy_database_responds_ok() {
        let state = HealthState {
            db: Database::open_in_memory().unwrap(),
        };

        let response = get_health(State(state), RequestContext::background()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "application/json");
        let body = parse_json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unreachable_database_responds_service_unavailable() {
        let state = HealthState {
            db: Database::open_in_memory().unwrap(),
        };
        let context = RequestContext::background();
        context.cancel();

        let response = get_health(State(state), context).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = parse_json_body(response).await;
        assert_eq!(body["error"]["message"], "Service unavailable");
    }
}
