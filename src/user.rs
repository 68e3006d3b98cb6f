//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error, Resource, UserId, ValidationError,
    db::{get_timestamp, to_unix_micros, truncate_to_micros},
    timestamp::serialize_rfc3339,
    validation::validate_email_present,
};

/// An email address that identifies a user.
///
/// The store only requires an email to be present. Checking that it is well
/// formed is left to the caller, see [crate::validation::validate_email_format].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create an email address.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] if `email` is empty or only whitespace.
    pub fn new(email: &str) -> Result<Self, ValidationError> {
        validate_email_present(email)?;

        Ok(Self(email.to_owned()))
    }

    /// Create an email address without validation.
    ///
    /// The caller should ensure that `email` is not empty.
    pub fn new_unchecked(email: &str) -> Self {
        Self(email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's email address, unique across all users.
    pub email: Email,
    /// When the user was created.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let created_at = get_timestamp(row, 2)?;

    Ok(User {
        id,
        email: Email::new_unchecked(&raw_email),
        created_at,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if a user with `email` already exists,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(email: Email, connection: &Connection) -> Result<User, Error> {
    let user = User {
        id: UserId::new_random(),
        email,
        created_at: truncate_to_micros(OffsetDateTime::now_utc()),
    };

    connection
        .execute(
            "INSERT INTO user (id, email, created_at) VALUES (?1, ?2, ?3)",
            (user.id, user.email.as_ref(), to_unix_micros(user.created_at)),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.contains("user.email") => {
                Error::DuplicateEmail(user.email.to_string())
            }
            error => error.into(),
        })?;

    tracing::debug!("Created user {}", user.id);

    Ok(user)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user,
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id)], map_user_row)
        .optional()?
        .ok_or(Error::NotFound(Resource::User))
}

/// Get the user from the database with the email address `email`.
///
/// Emails are matched exactly, including case.
///
/// # Errors
///
/// This function will return an error if:
/// - no user has the email `email`,
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, created_at FROM user WHERE email = :email")?
        .query_row(&[(":email", email.as_ref())], map_user_row)
        .optional()?
        .ok_or(Error::NotFound(Resource::User))
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}
