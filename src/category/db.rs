//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    CategoryId, Error, Resource, UserId,
    category::{Category, CategoryName},
    db::{get_timestamp, to_unix_micros, truncate_to_micros},
};

/// Create a category owned by `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if `user_id` does not refer to an existing user,
/// - [Error::DuplicateCategory] if the user already has a category called `name`,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    user_id: UserId,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = Category {
        id: CategoryId::new_random(),
        user_id,
        name,
        created_at: truncate_to_micros(OffsetDateTime::now_utc()),
    };

    connection
        .execute(
            "INSERT INTO category (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4);",
            (
                category.id,
                category.user_id,
                category.name.as_ref(),
                to_unix_micros(category.created_at),
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound(Resource::User),
            error => error.into(),
        })?;

    tracing::debug!("Created category {} for user {}", category.id, user_id);

    Ok(category)
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, user_id, name, created_at FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_category_row)
        .optional()?
        .ok_or(Error::NotFound(Resource::Category))
}

/// Retrieve the categories owned by `user_id`, newest first.
///
/// An ID that does not belong to any user simply yields no categories.
pub fn list_categories(user_id: UserId, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, created_at FROM category
            WHERE user_id = :user_id
            ORDER BY created_at DESC, rowid DESC;",
        )?
        .query_map(&[(":user_id", &user_id)], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Check that the category `category_id` exists and belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::CategoryOwnership] both when the category belongs to a
/// different user and when it does not exist at all. The two cases are
/// indistinguishable to the caller.
pub fn validate_ownership(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let is_owner = connection
        .prepare("SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2;")?
        .exists((category_id, user_id))?;

    if is_owner {
        Ok(())
    } else {
        Err(Error::CategoryOwnership)
    }
}

/// Get the number of categories in the database.
pub fn count_categories(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM category;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_created ON category(user_id, created_at);",
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let raw_name: String = row.get(2)?;
    let created_at = get_timestamp(row, 3)?;

    Ok(Category {
        id,
        user_id,
        name: CategoryName::new_unchecked(&raw_name),
        created_at,
    })
}
