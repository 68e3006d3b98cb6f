//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Amount, CategoryId, Error, RequestContext, Resource, TransactionId, UserId, ValidationError,
    category::{CategoryName, validate_ownership},
    db::{get_timestamp, to_unix_micros, truncate_to_micros},
    timestamp::serialize_rfc3339,
    validation::validate_description,
};

// ============================================================================
// MODELS
// ============================================================================

/// A trimmed, non-empty description of at most 1000 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    /// Validate an optional description.
    ///
    /// Descriptions that are empty after trimming are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] if the trimmed description is longer than
    /// 1000 characters. The description itself is not echoed in the error.
    pub fn new(description: Option<&str>) -> Result<Option<Self>, ValidationError> {
        validate_description(description).map(|description| description.map(Self))
    }

    /// Create a description without validation.
    pub fn new_unchecked(description: &str) -> Self {
        Self(description.to_owned())
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The category a transaction is filed under, with its name for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    #[serde(rename = "category_id")]
    pub id: CategoryId,
    #[serde(rename = "category_name")]
    pub name: CategoryName,
}

/// An event where a user spent money.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    /// The category of the transaction, `None` if it is uncategorized.
    #[serde(flatten)]
    pub category: Option<CategoryRef>,
    /// The amount of money spent.
    pub amount: Amount,
    /// A text description of what the transaction was for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    /// When the money was spent.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub occurred_at: OffsetDateTime,
    /// When the transaction was recorded.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(user_id: UserId, amount: Amount, occurred_at: OffsetDateTime) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            amount,
            occurred_at,
            category_id: None,
            description: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The amount and description are validated by their types, so a builder
/// only holds input with the right shape. Whether the user and category exist
/// is checked by [create_transaction].
///
/// # Examples
///
/// ```ignore
/// let builder = Transaction::build(user_id, "45.99".parse()?, OffsetDateTime::now_utc())
///     .category_id(Some(category_id))
///     .description(Description::new(Some("Coffee"))?);
///
/// let transaction = create_transaction(builder, &RequestContext::background(), &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user recording the transaction.
    pub user_id: UserId,

    /// The amount of money spent.
    pub amount: Amount,

    /// The business date of the transaction.
    ///
    /// Callers default this to the current time when the client gives none.
    pub occurred_at: OffsetDateTime,

    /// The category to file the transaction under.
    ///
    /// Must belong to `user_id`.
    pub category_id: Option<CategoryId>,

    /// An optional human-readable description.
    pub description: Option<Description>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<Description>) -> Self {
        self.description = description;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// If a category is given, its ownership is checked before the insert and no
/// row is written when the check fails. The existence of the user is only
/// checked by the foreign key constraint on insert.
///
/// `context` is checked again right before the insert, so a request that is
/// cancelled after the ownership check writes nothing. Pass a
/// [RequestContext::detach]ed context when running inside [crate::Database::run].
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryOwnership] if the category does not exist or belongs to another user,
/// - [Error::NotFound] if the user does not exist,
/// - [Error::Canceled] or [Error::Timeout] if `context` is done before the insert,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    context: &RequestContext,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if let Some(category_id) = builder.category_id {
        validate_ownership(category_id, builder.user_id, connection)?;
    }

    context.check()?;

    let id = TransactionId::new_random();
    let created_at = truncate_to_micros(OffsetDateTime::now_utc());

    connection
        .execute(
            "INSERT INTO \"transaction\"
                (id, user_id, category_id, amount, description, occurred_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                id,
                builder.user_id,
                builder.category_id,
                builder.amount,
                builder.description.as_ref().map(|description| description.as_ref()),
                to_unix_micros(builder.occurred_at),
                to_unix_micros(created_at),
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

    tracing::debug!("Created transaction {id} for user {}", builder.user_id);

    get_transaction(id, connection)
}

/// The columns read by [map_transaction_row], for a query that joins the
/// category table as `c` to the transaction table as `t`.
pub(crate) const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.category_id, c.name, t.amount, \
     t.description, t.occurred_at, t.created_at";

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t
             LEFT JOIN category c ON t.category_id = c.id
             WHERE t.id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .optional()?
        .ok_or(Error::NotFound(Resource::Transaction))
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                category_id TEXT,
                amount INTEGER NOT NULL CHECK (amount > 0 AND amount <= 9999999999),
                description TEXT,
                occurred_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Used by the transaction list and the summary.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_occurred
         ON \"transaction\"(user_id, occurred_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row selected with [TRANSACTION_COLUMNS] to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let category_id: Option<CategoryId> = row.get(2)?;
    let category_name: Option<String> = row.get(3)?;
    let amount = row.get(4)?;
    let description = row
        .get::<usize, Option<String>>(5)?
        .map(|description| Description::new_unchecked(&description));
    let occurred_at = get_timestamp(row, 6)?;
    let created_at = get_timestamp(row, 7)?;

    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(CategoryRef {
            id,
            name: CategoryName::new_unchecked(&name),
        }),
        _ => None,
    };

    Ok(Transaction {
        id,
        user_id,
        category,
        amount,
        description,
        occurred_at,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        Amount, CategoryId, Error, RequestContext, Resource, TransactionId, UserId,
        category::{Category, CategoryName, create_category},
        db::initialize,
        transaction::{
            Description, Transaction, count_transactions, create_transaction, get_transaction,
        },
        user::{Email, User, create_user},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(email: &str, conn: &Connection) -> User {
        create_user(Email::new_unchecked(email), conn).expect("Could not create user")
    }

    fn create_test_category(user: &User, name: &str, conn: &Connection) -> Category {
        create_category(user.id, CategoryName::new_unchecked(name), conn)
            .expect("Could not create category")
    }

    fn amount(text: &str) -> Amount {
        text.parse().unwrap()
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let occurred_at = datetime!(2025-10-05 12:30:00.123456 UTC);

        let transaction = create_transaction(
            Transaction::build(user.id, amount("12.30"), occurred_at)
                .description(Description::new(Some(" Lunch ")).unwrap()),
            &RequestContext::background(),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.amount.as_decimal(), Decimal::new(1230, 2));
        assert_eq!(transaction.category, None);
        assert_eq!(
            transaction.description,
            Some(Description::new_unchecked("Lunch"))
        );
        assert_eq!(transaction.occurred_at, occurred_at);
    }

    #[test]
    fn create_with_category_includes_category_name() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let category = create_test_category(&user, "Food", &conn);

        let transaction = create_transaction(
            Transaction::build(user.id, amount("10"), datetime!(2025-10-05 0:00 UTC))
                .category_id(Some(category.id)),
            &RequestContext::background(),
            &conn,
        )
        .expect("Could not create transaction");

        let category_ref = transaction.category.expect("transaction has no category");
        assert_eq!(category_ref.id, category.id);
        assert_eq!(category_ref.name, category.name);
    }

    #[test]
    fn create_with_other_users_category_fails_without_writing() {
        let conn = get_test_connection();
        let alice = create_test_user("alice@example.com", &conn);
        let bob = create_test_user("bob@example.com", &conn);
        let alices_category = create_test_category(&alice, "Food", &conn);

        let result = create_transaction(
            Transaction::build(bob.id, amount("10"), datetime!(2025-10-05 0:00 UTC))
                .category_id(Some(alices_category.id)),
            &RequestContext::background(),
            &conn,
        );

        assert_eq!(result, Err(Error::CategoryOwnership));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn create_with_missing_category_fails_like_foreign_category() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);

        let result = create_transaction(
            Transaction::build(user.id, amount("10"), datetime!(2025-10-05 0:00 UTC))
                .category_id(Some(CategoryId::new_random())),
            &RequestContext::background(),
            &conn,
        );

        assert_eq!(result, Err(Error::CategoryOwnership));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn create_fails_on_unknown_user() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build(
                UserId::new_random(),
                amount("10"),
                datetime!(2025-10-05 0:00 UTC),
            ),
            &RequestContext::background(),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound(Resource::User)));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn create_with_cancelled_context_writes_nothing() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let category = create_test_category(&user, "Food", &conn);
        let context = RequestContext::background();
        context.cancel();

        let result = create_transaction(
            Transaction::build(user.id, amount("10"), datetime!(2025-10-05 0:00 UTC))
                .category_id(Some(category.id)),
            &context,
            &conn,
        );

        assert_eq!(result, Err(Error::Canceled));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn accepts_the_amount_bounds() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);

        for value in ["0.01", "99999999.99"] {
            let transaction = create_transaction(
                Transaction::build(user.id, amount(value), datetime!(2025-10-05 0:00 UTC)),
                &RequestContext::background(),
                &conn,
            )
            .expect("Could not create transaction");

            assert_eq!(transaction.amount, amount(value));
        }
    }

    #[test]
    fn table_rejects_non_positive_amounts() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);

        let result = conn.execute(
            "INSERT INTO \"transaction\" (id, user_id, amount, occurred_at, created_at)
             VALUES (?1, ?2, 0, 0, 0)",
            (TransactionId::new_random(), user.id),
        );

        assert!(result.is_err());
    }

    #[test]
    fn get_transaction_with_unknown_id_returns_not_found() {
        let conn = get_test_connection();

        let result = get_transaction(TransactionId::new_random(), &conn);

        assert_eq!(result, Err(Error::NotFound(Resource::Transaction)));
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let user = create_test_user("foo@bar.baz", &conn);
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(
                Transaction::build(
                    user.id,
                    Amount::from_cents_unchecked(i * 100),
                    datetime!(2025-10-05 0:00 UTC),
                ),
                &RequestContext::background(),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count as u32, got_count);
    }
}
