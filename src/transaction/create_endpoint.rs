//! Defines the endpoint for creating a new transaction.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::value::RawValue;
use time::OffsetDateTime;

use crate::{
    Amount, AppState, CategoryId, Error, RequestContext, UserId, ValidationError,
    db::{Database, truncate_to_micros},
    transaction::{Description, Transaction, create_transaction},
    validation::parse_timestamp,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database for managing transactions.
    pub db: Database,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// The JSON body for creating a transaction.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub user_id: String,
    pub category_id: Option<String>,
    /// The amount spent in dollars, with at most two decimal places.
    ///
    /// Kept as the raw JSON text so the digits are never rounded through a float.
    pub amount: Option<Box<RawValue>>,
    pub description: Option<String>,
    /// An RFC3339 timestamp, defaults to the time of the request.
    pub occurred_at: Option<String>,
}

/// A route handler for creating a new transaction, responds with the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    context: RequestContext,
    request: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(request) = request?;

    let user_id = UserId::parse("user_id", &request.user_id)?;
    let category_id = request
        .category_id
        .as_deref()
        .map(|category_id| CategoryId::parse("category_id", category_id))
        .transpose()?;
    let amount = match request.amount.as_deref() {
        Some(amount) => Amount::from_json_number(amount)?,
        None => return Err(ValidationError::new("amount", "amount is required").into()),
    };
    let description = Description::new(request.description.as_deref())?;
    let occurred_at = match request.occurred_at.as_deref() {
        Some(occurred_at) => parse_timestamp("occurred_at", occurred_at)?,
        None => OffsetDateTime::now_utc(),
    };

    let builder = Transaction::build(user_id, amount, truncate_to_micros(occurred_at))
        .category_id(category_id)
        .description(description);

    let detached = context.detach();
    let transaction = state
        .db
        .run(&context, move |connection| {
            create_transaction(builder, &detached, connection)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
