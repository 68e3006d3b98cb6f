//! The endpoint for getting a user's spending summary.

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use time::OffsetDateTime;

use crate::{
    AppState, Error, RequestContext,
    db::Database,
    summary::{Summary, compute_summary},
    transaction::UserDateRangeQuery,
};

/// The state needed to compute summaries.
#[derive(Debug, Clone)]
pub struct SummaryState {
    pub db: Database,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// A route handler for the total spending per category of a user.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    context: RequestContext,
    query: Result<Query<UserDateRangeQuery>, QueryRejection>,
) -> Result<Json<Summary>, Error> {
    let Query(query) = query?;
    let (user_id, range) = query.parse()?;
    let now = OffsetDateTime::now_utc();

    let summary = state
        .db
        .run(&context, move |connection| {
            compute_summary(user_id, range, now, connection)
        })
        .await?;

    Ok(Json(summary))
}

#[cfg(test)]
mod summary_endpoint_tests {
    use axum::{
        Json,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        RequestContext, UserId,
        db::Database,
        test_utils::{assert_error_field, parse_json_body},
        transaction::UserDateRangeQuery,
    };

    use super::{SummaryState, get_summary_endpoint};

    fn get_state() -> SummaryState {
        SummaryState {
            db: Database::open_in_memory().unwrap(),
        }
    }

    #[tokio::test]
    async fn echoes_the_literal_bounds() {
        let user_id = UserId::new_random();
        let query = UserDateRangeQuery {
            user_id: Some(user_id.to_string()),
            from: Some("2025-01-01T00:00:00Z".to_owned()),
            to: Some("2025-01-31T00:00:00Z".to_owned()),
        };

        let Json(summary) =
            get_summary_endpoint(State(get_state()), RequestContext::background(), Ok(Query(query)))
                .await
                .unwrap();

        let body = serde_json::to_value(summary).unwrap();
        assert_eq!(body["user_id"], user_id.to_string());
        assert_eq!(body["from"], "2025-01-01T00:00:00Z");
        assert_eq!(body["to"], "2025-01-31T00:00:00Z");
        assert_eq!(body["categories"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn from_after_to_is_rejected() {
        let query = UserDateRangeQuery {
            user_id: Some(UserId::new_random().to_string()),
            from: Some("2025-02-01T00:00:00Z".to_owned()),
            to: Some("2025-01-01T00:00:00Z".to_owned()),
        };

        let response =
            get_summary_endpoint(State(get_state()), RequestContext::background(), Ok(Query(query)))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json_body(response).await;
        assert_error_field(&body, StatusCode::BAD_REQUEST, "from");
    }

    #[tokio::test]
    async fn timed_out_request_reports_timeout() {
        let query = UserDateRangeQuery {
            user_id: Some(UserId::new_random().to_string()),
            ..Default::default()
        };
        let context = RequestContext::with_timeout(std::time::Duration::ZERO);

        let response = get_summary_endpoint(State(get_state()), context, Ok(Query(query)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
