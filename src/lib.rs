//! fintrack is a backend for tracking personal finances.
//!
//! Users record transactions, optionally filed under categories they own,
//! and ask for the totals spent per category over a date range.
//!
//! This library provides a JSON REST API backed by SQLite.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod amount;
mod app_state;
mod category;
mod config;
mod context;
mod database_id;
mod db;
mod endpoints;
mod error;
mod health;
mod logging;
mod register_user;
mod routing;
mod summary;
mod timestamp;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use amount::Amount;
pub use app_state::{AppState, DEFAULT_REQUEST_TIMEOUT};
pub use category::{Category, CategoryName};
pub use config::AppConfig;
pub use context::RequestContext;
pub use database_id::{CategoryId, TransactionId, UserId};
pub use db::{Database, initialize as initialize_db};
pub use error::{Error, Resource, ValidationError};
pub use routing::{REQUEST_ID_HEADER, add_cors_layer, build_router};
pub use summary::{CategorySummary, Summary, SummaryBucket};
pub use transaction::{DateRange, Transaction};
pub use user::{Email, User};

/// How long in-flight requests get to finish once shutdown has begun.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the ctrl+c signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received ctrl+c signal, shutting down.");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down.");
        },
    }

    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
