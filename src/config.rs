//! Command line and environment configuration for the server.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// The REST API server for fintrack.
///
/// Every option can also be set with the environment variable named in its
/// help text. Command line arguments take precedence.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct AppConfig {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    pub db_path: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// The minimum level of the log messages to emit, e.g. "debug", or a
    /// full filter directive such as "fintrack=debug,tower_http=info".
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// How long, in milliseconds, the store work for a single request may take.
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,

    /// Accept cross-origin requests from any origin.
    #[arg(long, env = "CORS_ENABLED", default_value_t = false)]
    pub cors_enabled: bool,
}

impl AppConfig {
    /// The time limit for the store work of a single request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
