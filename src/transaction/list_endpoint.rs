//! Defines the endpoint for listing a user's transactions.

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::{
    AppState, Error, RequestContext, UserId,
    db::Database,
    transaction::{DateRange, Transaction, list_transactions},
    validation::{parse_optional_timestamp, require_query_param},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    pub db: Database,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// The query parameters shared by the transaction list and the summary.
#[derive(Debug, Default, Deserialize)]
pub struct UserDateRangeQuery {
    pub user_id: Option<String>,
    /// An RFC3339 timestamp for the inclusive start of the range.
    pub from: Option<String>,
    /// An RFC3339 timestamp for the inclusive end of the range.
    pub to: Option<String>,
}

impl UserDateRangeQuery {
    /// Validate the user ID and date range.
    pub fn parse(&self) -> Result<(UserId, DateRange), Error> {
        let user_id = require_query_param("user_id", self.user_id.as_deref())?;
        let user_id = UserId::parse("user_id", user_id)?;
        let from = parse_optional_timestamp("from", self.from.as_deref())?;
        let to = parse_optional_timestamp("to", self.to.as_deref())?;

        Ok((user_id, DateRange::new(from, to)?))
    }
}

/// A route handler for listing the transactions of a user, most recent first.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    context: RequestContext,
    query: Result<Query<UserDateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(query) = query?;
    let (user_id, range) = query.parse()?;

    let transactions = state
        .db
        .run(&context, move |connection| {
            list_transactions(user_id, range, connection)
        })
        .await?;

    Ok(Json(transactions))
}
