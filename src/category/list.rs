//! The endpoint for listing a user's categories.

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::{
    AppState, Error, RequestContext, UserId,
    category::{Category, list_categories},
    db::Database,
    validation::require_query_param,
};

/// The state needed for listing categories.
#[derive(Debug, Clone)]
pub struct ListCategoriesState {
    pub db: Database,
}

impl FromRef<AppState> for ListCategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// The query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    pub user_id: Option<String>,
}

/// A route handler for listing the categories of a user, newest first.
pub async fn list_categories_endpoint(
    State(state): State<ListCategoriesState>,
    context: RequestContext,
    query: Result<Query<ListCategoriesQuery>, QueryRejection>,
) -> Result<Json<Vec<Category>>, Error> {
    let Query(query) = query?;

    let user_id = require_query_param("user_id", query.user_id.as_deref())?;
    let user_id = UserId::parse("user_id", user_id)?;

    let categories = state
        .db
        .run(&context, move |connection| {
            list_categories(user_id, connection)
        })
        .await?;

    Ok(Json(categories))
}
