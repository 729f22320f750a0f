//! Notification dispatcher
//!
//! Lifecycle transitions in the other modules fan out here. The append is
//! best-effort: a notification that cannot be written is logged and
//! dropped, and the triggering operation still succeeds. Read tracking
//! (mark one, mark all, unread badge count) is independent of creation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;
use tutorlink_common::db::models::{Notification, NotificationKind};
use tutorlink_common::events::{EngageEvent, EventBus};
use tutorlink_common::{ids, Error, Result};
use uuid::Uuid;

/// A notification about to be dispatched
#[derive(Debug, Clone)]
pub struct Notice {
    pub recipient: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Opaque reference to the triggering entity
    pub related_id: Option<String>,
    /// Opaque deep link for the presentation layer
    pub action_url: Option<String>,
}

/// Append a notification row and emit NotificationCreated
pub async fn notify(notice: Notice, db: &SqlitePool, bus: &EventBus) -> Result<Notification> {
    let guid = ids::generate();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO notifications
         (guid, user_id, kind, title, message, related_id, action_url, is_read, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(guid.to_string())
    .bind(notice.recipient.to_string())
    .bind(notice.kind.as_str())
    .bind(&notice.title)
    .bind(&notice.message)
    .bind(&notice.related_id)
    .bind(&notice.action_url)
    .bind(now)
    .execute(db)
    .await?;

    bus.emit_lossy(EngageEvent::NotificationCreated {
        notification_id: guid,
        user_id: notice.recipient,
        kind: notice.kind,
        timestamp: now,
    });

    Ok(Notification {
        guid,
        user_id: notice.recipient,
        kind: notice.kind,
        title: notice.title,
        message: notice.message,
        related_id: notice.related_id,
        action_url: notice.action_url,
        is_read: false,
        read_at: None,
        created_at: now,
    })
}

/// Append a notification without letting a failure reach the caller
///
/// The primary write of a lifecycle operation is already committed by the
/// time this runs; losing the notification is acceptable, losing the
/// operation is not.
pub async fn notify_best_effort(notice: Notice, db: &SqlitePool, bus: &EventBus) {
    let recipient = notice.recipient;
    let kind = notice.kind;
    if let Err(e) = notify(notice, db, bus).await {
        warn!(
            "Failed to write {} notification for {}: {}",
            kind.as_str(),
            recipient,
            e
        );
    }
}

/// Mark one notification read; only the recipient's own rows match
pub async fn mark_read(
    caller: Uuid,
    notification_id: Uuid,
    db: &SqlitePool,
) -> Result<Notification> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = ? WHERE guid = ? AND user_id = ?",
    )
    .bind(now)
    .bind(notification_id.to_string())
    .bind(caller.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "Notification not found: {}",
            notification_id
        )));
    }

    let row = sqlx::query("SELECT * FROM notifications WHERE guid = ?")
        .bind(notification_id.to_string())
        .fetch_one(db)
        .await?;
    Notification::from_row(&row)
}

/// Mark every unread notification of the caller read, returning the count
pub async fn mark_all_read(caller: Uuid, db: &SqlitePool) -> Result<u64> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = ? WHERE user_id = ? AND is_read = 0",
    )
    .bind(now)
    .bind(caller.to_string())
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

/// Unread badge count
pub async fn count_unread(caller: Uuid, db: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(caller.to_string())
    .fetch_one(db)
    .await?;

    Ok(count)
}

/// Newest notifications first, bounded by `limit` (default 50)
pub async fn list_notifications(
    caller: Uuid,
    limit: Option<i64>,
    db: &SqlitePool,
) -> Result<Vec<Notification>> {
    let limit = limit.unwrap_or(50).clamp(1, 500);
    let rows = sqlx::query(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(caller.to_string())
    .bind(limit)
    .fetch_all(db)
    .await?;

    rows.iter().map(Notification::from_row).collect()
}
