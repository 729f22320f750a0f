//! TutorLink Engagement Service - Main entry point
//!
//! Hosts the tutor-student engagement lifecycle over SQLite: connection
//! requests, session scheduling, task tracking, notifications, messaging,
//! and the SSE change feed.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutorlink_common::config;
use tutorlink_common::db::init_database;
use tutorlink_common::events::EventBus;
use tutorlink_engage::{build_router, AppState};

/// Event bus capacity: enough to absorb a dashboard's worth of bursty
/// writes without lagging live SSE subscribers
const EVENT_BUS_CAPACITY: usize = 1000;

/// Command-line arguments for tutorlink-engage
#[derive(Parser, Debug)]
#[command(name = "tutorlink-engage")]
#[command(about = "Engagement lifecycle service for TutorLink")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "TUTORLINK_PORT")]
    port: u16,

    /// Root folder holding the database (falls back to env, config file,
    /// then the platform data directory)
    #[arg(short, long)]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorlink_engage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Log build identification immediately after tracing init
    info!(
        "Starting TutorLink Engagement Service (tutorlink-engage) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder =
        config::resolve_root_folder(args.root_folder.as_deref(), "TUTORLINK_ROOT_FOLDER");
    config::ensure_root_folder(&root_folder).context("Failed to create root folder")?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));

    let state = AppState::new(pool, bus);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
