use std::{net::SocketAddr, process::ExitCode};

use axum_server::Handle;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack::{AppConfig, AppState, Database, add_cors_layer, build_router, graceful_shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::parse();

    setup_logging(&config.log_level);

    let db = match Database::open(&config.db_path) {
        Ok(db) => db,
        Err(error) => {
            tracing::error!(
                "Could not open the database at {}: {error}",
                config.db_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(db, config.request_timeout());
    let router = build_router(state);
    let router = if config.cors_enabled {
        add_cors_layer(router)
    } else {
        router
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("HTTP server listening on {}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("The server stopped unexpectedly: {error}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server shut down");
    ExitCode::SUCCESS
}

fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|error| {
        eprintln!("Invalid log level \"{log_level}\", falling back to \"info\": {error}");
        EnvFilter::new("info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
