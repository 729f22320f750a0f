//! # TutorLink Engagement Service (tutorlink-engage)
//!
//! Backend core of the tutoring marketplace's tutor-student engagement
//! lifecycle: connection requests, session scheduling, task tracking,
//! notifications, and messaging, over a SQLite entity store with
//! broadcast-event push to live SSE subscribers.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tutorlink_common::events::EventBus;

pub mod api;
pub mod connections;
pub mod groups;
pub mod messaging;
pub mod notifications;
pub mod profiles;
pub mod sessions;
pub mod tasks;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Entity store
    pub db: SqlitePool,
    /// Change-event bus feeding the SSE surface
    pub bus: Arc<EventBus>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, bus: Arc<EventBus>) -> Self {
        Self { db, bus }
    }
}

/// Build application router
///
/// Every /api route resolves the caller from the X-User-Id header via the
/// CallerId extractor; /health is the only anonymous route.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post, put};

    Router::new()
        // SSE event stream
        .route("/api/events", get(api::event_stream))
        // Profiles (read-only surface)
        .route("/api/profiles/:id", get(api::profiles::get_profile))
        // Connection lifecycle
        .route(
            "/api/connections/request",
            post(api::connections::request_connection),
        )
        // Path parameter name is shared across the sibling routes; it is
        // the student on respond, the tutor on disconnect.
        .route(
            "/api/connections/:user_id/respond",
            post(api::connections::respond_to_connection),
        )
        .route(
            "/api/connections/status",
            get(api::connections::connection_status),
        )
        .route("/api/connections", get(api::connections::list_connections))
        .route(
            "/api/connections/:user_id",
            delete(api::connections::disconnect),
        )
        // Session scheduling
        .route("/api/sessions", post(api::sessions::request_session))
        .route("/api/sessions", get(api::sessions::list_sessions))
        .route(
            "/api/sessions/:id/respond",
            post(api::sessions::respond_to_session),
        )
        .route(
            "/api/sessions/:id/complete",
            post(api::sessions::complete_session),
        )
        .route(
            "/api/sessions/:id/cancel",
            post(api::sessions::cancel_session),
        )
        .route("/api/sessions/:id", get(api::sessions::get_session))
        // Task tracking
        .route("/api/tasks", post(api::tasks::assign_task))
        .route("/api/tasks", get(api::tasks::list_tasks))
        .route(
            "/api/tasks/:id/completion",
            put(api::tasks::set_completion),
        )
        // Notifications
        .route(
            "/api/notifications",
            get(api::notifications::list_notifications),
        )
        .route(
            "/api/notifications/:id/read",
            post(api::notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            post(api::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/unread-count",
            get(api::notifications::unread_count),
        )
        // Messaging
        .route("/api/messages", post(api::messages::send_message))
        .route("/api/messages/thread", get(api::messages::fetch_thread))
        .route(
            "/api/messages/thread/:user_id/read",
            post(api::messages::mark_thread_read),
        )
        .route(
            "/api/messages/conversations",
            get(api::messages::list_conversations),
        )
        .route(
            "/api/messages/unread-count",
            get(api::messages::unread_count),
        )
        // Health (no identity required)
        .merge(api::health_routes())
        .with_state(state)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
