//! Implements a struct that holds the state of the REST server.

use std::time::Duration;

use crate::db::Database;

/// The default time limit for the store work done by a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The handle to the application database.
    pub db: Database,

    /// How long the store work for a single request may take before it is
    /// abandoned with a timeout error.
    pub request_timeout: Duration,
}

impl AppState {
    /// Create a new [AppState] from an initialized database.
    pub fn new(db: Database, request_timeout: Duration) -> Self {
        Self {
            db,
            request_timeout,
        }
    }
}
