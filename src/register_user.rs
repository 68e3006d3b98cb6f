//! The endpoint for registering a new user.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState, Error, RequestContext,
    db::Database,
    user::{Email, User, create_user},
    validation::validate_email_format,
};

/// The state needed for registering a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db: Database,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }
}

/// The JSON body for registering a user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
}

/// A route handler for registering a user, responds with the new user.
///
/// The email must be well formed. Emails are unique and compared exactly.
pub async fn register_user(
    State(state): State<RegistrationState>,
    context: RequestContext,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Error> {
    let Json(request) = request?;

    validate_email_format(&request.email)?;
    let email = Email::new(&request.email)?;

    let user = state
        .db
        .run(&context, move |connection| create_user(email, connection))
        .await?;

    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
mod register_user_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{endpoints, register_user::register_user, test_utils::get_test_state};

    fn get_test_server() -> TestServer {
        let app: Router = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(get_test_state());

        TestServer::new(app)
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({ "email": "foo@bar.baz" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["email"], "foo@bar.baz");
        assert_eq!(body["id"].as_str().map(str::len), Some(36));
        assert!(body["created_at"].is_string());
    }

    #[tokio::test]
    async fn create_user_fails_with_existing_email() {
        let server = get_test_server();
        server
            .post(endpoints::USERS)
            .json(&json!({ "email": "foo@bar.baz" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::USERS)
            .json(&json!({ "email": "foo@bar.baz" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "Conflict");
        assert_eq!(body["error"]["message"], "email already exists");
        assert_eq!(body["error"]["details"]["field"], "email");
        assert_eq!(body["error"]["details"]["value"], "foo@bar.baz");
    }

    #[tokio::test]
    async fn create_user_fails_with_malformed_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({ "email": "not an email" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["details"]["field"], "email");
        assert_eq!(body["error"]["details"]["value"], "not an email");
    }

    #[tokio::test]
    async fn create_user_fails_with_missing_email() {
        let server = get_test_server();

        let response = server.post(endpoints::USERS).json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "email is required");
    }

    #[tokio::test]
    async fn create_user_fails_with_invalid_json() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .bytes("{\"email\":".into())
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "invalid request body");
    }

    #[tokio::test]
    async fn create_user_fails_without_json_content_type() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .text("{\"email\":\"foo@bar.baz\"}")
            .await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
