//! Database initialization and the handle used to run store operations.

use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use rusqlite::{Connection, InterruptHandle, Transaction as SqlTransaction};
use time::OffsetDateTime;

use crate::{
    Error, RequestContext, category::create_category_table, context::check_expired,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the tables for the domain models if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`, since SQLite
/// leaves it off by default and the stores rely on it.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Check that the database can execute a query.
pub fn ping(connection: &Connection) -> Result<(), Error> {
    connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

    Ok(())
}

/// Convert a timestamp to the integer representation stored in the database:
/// microseconds since the Unix epoch.
pub(crate) fn to_unix_micros(timestamp: OffsetDateTime) -> i64 {
    // Fits comfortably: i64 microseconds cover several hundred thousand years.
    (timestamp.unix_timestamp_nanos() / 1_000) as i64
}

/// Convert microseconds since the Unix epoch back to a UTC timestamp.
pub(crate) fn from_unix_micros(micros: i64) -> Result<OffsetDateTime, rusqlite::Error> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(error))
    })
}

/// Read a timestamp column stored by [to_unix_micros].
pub(crate) fn get_timestamp(row: &rusqlite::Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    from_unix_micros(row.get(index)?)
}

/// Truncate a timestamp to the precision stored in the database.
pub(crate) fn truncate_to_micros(timestamp: OffsetDateTime) -> OffsetDateTime {
    let nanosecond = timestamp.nanosecond();

    timestamp
        .replace_nanosecond(nanosecond - nanosecond % 1_000)
        .unwrap_or(timestamp)
}

/// A shared handle to the application database.
///
/// All store operations are synchronous functions that take a `&Connection`.
/// [Database::run] executes one on the blocking thread pool and bounds it by
/// a [RequestContext].
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    interrupt_handle: Arc<InterruptHandle>,
    /// The ID of the call that currently holds the connection, if any.
    running_call: Arc<Mutex<Option<u64>>>,
    next_call_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connection", &self.connection)
            .field("running_call", &self.running_call)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Wrap an open connection, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        let interrupt_handle = Arc::new(connection.get_interrupt_handle());

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            interrupt_handle,
            running_call: Arc::new(Mutex::new(None)),
            next_call_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Open (or create) the SQLite database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let connection = Connection::open(path)?;

        Self::new(connection)
    }

    /// Create a database that lives in memory for the lifetime of the handle.
    pub fn open_in_memory() -> Result<Self, Error> {
        let connection = Connection::open_in_memory()?;

        Self::new(connection)
    }

    /// Run the store operation `operation` bounded by `context`.
    ///
    /// - If `context` is already done, the store is not touched.
    /// - If `context` finishes while `operation` waits for the connection,
    ///   `operation` is skipped.
    /// - If `context` finishes while `operation` is executing, the running
    ///   SQL statement is interrupted, so a single-statement write either
    ///   completes before the signal or not at all.
    ///
    /// No retries are attempted.
    ///
    /// # Errors
    ///
    /// Returns [Error::Canceled] or [Error::Timeout] if `context` finishes
    /// first, otherwise the error returned by `operation`.
    pub async fn run<T, F>(&self, context: &RequestContext, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        context.check()?;

        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let connection = Arc::clone(&self.connection);
        let running_call = Arc::clone(&self.running_call);
        let token = context.token();
        let deadline = context.deadline();

        let task = tokio::task::spawn_blocking(move || {
            let connection = connection.lock().map_err(|_| Error::DatabaseLockError)?;

            // The caller may have given up while this call was queued.
            check_expired(&token, deadline)?;

            set_running_call(&running_call, Some(call_id))?;
            let result = operation(&connection);
            set_running_call(&running_call, None)?;

            result
        });

        // A finished call reports its own result even if the context expired
        // at the same time.
        tokio::select! {
            biased;
            joined = task => joined.map_err(|error| Error::TaskFailed(error.to_string()))?,
            error = context.done() => {
                self.interrupt_call(call_id);
                tracing::warn!("Store call {call_id} stopped early: {error}");
                Err(error)
            }
        }
    }

    /// Check that the database can execute a query.
    pub async fn ping(&self, context: &RequestContext) -> Result<(), Error> {
        self.run(context, ping).await
    }

    /// Interrupt the statement that is executing, but only if it belongs to `call_id`.
    fn interrupt_call(&self, call_id: u64) {
        let Ok(running_call) = self.running_call.lock() else {
            return;
        };

        if *running_call == Some(call_id) {
            self.interrupt_handle.interrupt();
        }
    }
}

fn set_running_call(running_call: &Mutex<Option<u64>>, call_id: Option<u64>) -> Result<(), Error> {
    *running_call.lock().map_err(|_| Error::DatabaseLockError)? = call_id;

    Ok(())
}
