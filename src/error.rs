//! Defines the app level error type and its conversion to JSON error responses.

use std::fmt::Display;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};

/// The kind of record that a [Error::NotFound] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A [crate::User].
    User,
    /// A [crate::Category].
    Category,
    /// A [crate::Transaction].
    Transaction,
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::User => "user",
            Resource::Category => "category",
            Resource::Transaction => "transaction",
        };

        write!(f, "{name}")
    }
}

/// Malformed input, detected before any store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The machine-readable name of the offending field, e.g. "user_id".
    pub field: &'static str,
    /// A human-readable description of the problem.
    pub message: String,
    /// An echo of the rejected value.
    ///
    /// Left empty for free-text fields so that injected content is never
    /// reflected back to the client.
    pub value: Option<String>,
}

impl ValidationError {
    /// A validation error for `field` that does not echo the rejected value.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            value: None,
        }
    }

    /// Attach the rejected value to the error.
    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The input did not have the expected shape.
    ///
    /// These errors are raised by the constructors of the validated input
    /// types, so they never reach the store.
    #[error("{0}")]
    Validation(ValidationError),

    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(Resource),

    /// A user with the given email already exists.
    #[error("email already exists")]
    DuplicateEmail(String),

    /// The user already has a category with the same name.
    #[error("category name already exists for this user")]
    DuplicateCategory,

    /// The category does not exist or belongs to a different user.
    ///
    /// Both cases share this error, so a response never reveals whether
    /// another user's category exists.
    #[error("category does not belong to user")]
    CategoryOwnership,

    /// The caller cancelled the operation before it completed.
    #[error("the operation was canceled")]
    Canceled,

    /// The operation did not complete before the caller's deadline.
    #[error("the operation timed out")]
    Timeout,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The blocking task running a store operation panicked or was aborted.
    #[error("the store task failed: {0}")]
    TaskFailed(String),

    /// The request body could not be parsed as the expected JSON document.
    #[error("invalid request body")]
    InvalidRequestBody,

    /// The request body is larger than the server accepts.
    #[error("request body too large")]
    PayloadTooLarge,

    /// The request body was not sent as `application/json`.
    #[error("Content-Type must be application/json")]
    UnsupportedMediaType,
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::Validation(value)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {rejection}");

        match rejection {
            JsonRejection::MissingJsonContentType(_) => Error::UnsupportedMediaType,
            _ => Error::InvalidRequestBody,
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {rejection}");

        Error::Validation(ValidationError::new("query", "invalid query string"))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: rusqlite::ErrorCode::OperationInterrupted,
                    extended_code: _,
                },
                _,
            ) => Error::Canceled,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.contains("category.user_id") && desc.contains("category.name") => {
                Error::DuplicateCategory
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code used when this error is returned to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::CategoryOwnership | Error::InvalidRequestBody => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateEmail(_) | Error::DuplicateCategory => StatusCode::CONFLICT,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Canceled => StatusCode::SERVICE_UNAVAILABLE,
            Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Error::SqlError(_) | Error::DatabaseLockError | Error::TaskFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            Error::NotFound(resource) => {
                let mut message = resource.to_string();
                message[..1].make_ascii_uppercase();
                format!("{message} not found")
            }
            Error::SqlError(_) | Error::DatabaseLockError | Error::TaskFailed(_) => {
                "An unexpected error occurred".to_owned()
            }
            error => error.to_string(),
        }
    }

    /// The offending field and, unless it is free text, its value.
    fn details(&self) -> Option<Value> {
        let (field, value) = match self {
            Error::Validation(validation) => (validation.field, validation.value.as_deref()),
            Error::DuplicateEmail(email) => ("email", Some(email.as_str())),
            Error::DuplicateCategory => ("name", None),
            _ => return None,
        };

        let mut details = Map::new();
        details.insert("field".to_owned(), json!(field));
        if let Some(value) = value {
            details.insert("value".to_owned(), json!(value));
        }

        Some(Value::Object(details))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Error::SqlError(_) | Error::DatabaseLockError | Error::TaskFailed(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
            }
            Error::Canceled | Error::Timeout => {
                tracing::warn!("Request did not complete: {}", self);
            }
            _ => {}
        }

        let mut body = Map::new();
        body.insert(
            "code".to_owned(),
            json!(status.canonical_reason().unwrap_or("Error")),
        );
        body.insert("message".to_owned(), json!(self.client_message()));
        if let Some(details) = self.details() {
            body.insert("details".to_owned(), details);
        }

        (status, Json(json!({ "error": body }))).into_response()
    }
}
