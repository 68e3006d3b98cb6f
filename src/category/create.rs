//! The endpoint for creating a category.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState, Error, RequestContext, UserId,
    category::{Category, CategoryName, create_category},
    db::Database,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db: Database,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// The JSON body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
}

/// A route handler for creating a category, responds with the new category.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    context: RequestContext,
    request: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let Json(request) = request?;

    let user_id = UserId::parse("user_id", &request.user_id)?;
    let name = CategoryName::new(&request.name)?;

    let category = state
        .db
        .run(&context, move |connection| {
            create_category(user_id, name, connection)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}
