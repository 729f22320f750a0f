//! Connection lifecycle manager
//!
//! Owns the request -> accepted/rejected state machine between one student
//! and one tutor. The connection_requests row is the sole record of the
//! relationship: session scheduling and task assignment both gate on it
//! being accepted.
//!
//! State machine: none -> pending -> accepted | rejected. Re-requesting
//! after a rejection flips the same row back to pending (the one-row-per-
//! pair invariant is backed by UNIQUE(student_id, tutor_id)). A student
//! disconnect deletes the row from any state.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tutorlink_common::db::models::{ConnectionRequest, ConnectionStatus};
use tutorlink_common::events::{EngageEvent, EventBus};
use tutorlink_common::{ids, Error, Result};
use uuid::Uuid;

use crate::notifications::{self, Notice};
use crate::profiles;
use tutorlink_common::db::models::NotificationKind;

/// Tutor's answer to a pending connection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionDecision {
    Accept,
    Reject,
}

/// Which side of the (student, tutor) pair the caller occupies in a list
/// query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Student,
    Tutor,
}

/// Student requests a connection with a tutor
///
/// Re-uses an existing rejected row (same guid, status back to pending)
/// rather than inserting a second row for the pair. A row already pending
/// or accepted is a conflict.
pub async fn request_connection(
    caller: Uuid,
    tutor_id: Uuid,
    message: &str,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<ConnectionRequest> {
    if caller == tutor_id {
        return Err(Error::InvalidInput(
            "Cannot request a connection with yourself".to_string(),
        ));
    }

    let tutor = profiles::find_profile(tutor_id, db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Tutor profile not found: {}", tutor_id)))?;
    if !tutor.role.can_tutor() {
        return Err(Error::InvalidInput(format!(
            "Profile {} does not offer tutoring",
            tutor_id
        )));
    }

    let now = Utc::now();
    let request = match find_pair(caller, tutor_id, db).await? {
        Some(existing) => match existing.status {
            ConnectionStatus::Pending => {
                return Err(Error::StateConflict(
                    "A connection request is already pending with this tutor".to_string(),
                ));
            }
            ConnectionStatus::Accepted => {
                return Err(Error::StateConflict(
                    "Already connected with this tutor".to_string(),
                ));
            }
            ConnectionStatus::Rejected => {
                sqlx::query(
                    "UPDATE connection_requests
                     SET status = 'pending', message = ?, updated_at = ?
                     WHERE guid = ?",
                )
                .bind(message)
                .bind(now)
                .bind(existing.guid.to_string())
                .execute(db)
                .await?;

                ConnectionRequest {
                    status: ConnectionStatus::Pending,
                    message: message.to_string(),
                    updated_at: now,
                    ..existing
                }
            }
        },
        None => {
            let guid = ids::generate();
            sqlx::query(
                "INSERT INTO connection_requests
                 (guid, student_id, tutor_id, status, message, created_at, updated_at)
                 VALUES (?, ?, ?, 'pending', ?, ?, ?)",
            )
            .bind(guid.to_string())
            .bind(caller.to_string())
            .bind(tutor_id.to_string())
            .bind(message)
            .bind(now)
            .bind(now)
            .execute(db)
            .await?;

            ConnectionRequest {
                guid,
                student_id: caller,
                tutor_id,
                status: ConnectionStatus::Pending,
                message: message.to_string(),
                created_at: now,
                updated_at: now,
            }
        }
    };

    notifications::notify_best_effort(
        Notice {
            recipient: tutor_id,
            kind: NotificationKind::ConnectionRequest,
            title: "New Connection Request".to_string(),
            message: "A student sent you a tutoring request.".to_string(),
            related_id: Some(request.guid.to_string()),
            action_url: Some("/tutor/requests".to_string()),
        },
        db,
        bus,
    )
    .await;

    bus.emit_lossy(EngageEvent::ConnectionChanged {
        student_id: caller,
        tutor_id,
        status: Some(ConnectionStatus::Pending),
        timestamp: now,
    });

    Ok(request)
}

/// Tutor answers a pending request from a student
///
/// Acceptance notifies the student; rejection does not.
pub async fn respond_to_connection(
    caller: Uuid,
    student_id: Uuid,
    decision: ConnectionDecision,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<ConnectionRequest> {
    let existing = find_pair(student_id, caller, db).await?.ok_or_else(|| {
        Error::NotFound(format!("No connection request from student {}", student_id))
    })?;

    if existing.status != ConnectionStatus::Pending {
        return Err(Error::StateConflict(format!(
            "Connection request is {}, not pending",
            existing.status.as_str()
        )));
    }

    let new_status = match decision {
        ConnectionDecision::Accept => ConnectionStatus::Accepted,
        ConnectionDecision::Reject => ConnectionStatus::Rejected,
    };

    let now = Utc::now();
    sqlx::query("UPDATE connection_requests SET status = ?, updated_at = ? WHERE guid = ?")
        .bind(new_status.as_str())
        .bind(now)
        .bind(existing.guid.to_string())
        .execute(db)
        .await?;

    if new_status == ConnectionStatus::Accepted {
        notifications::notify_best_effort(
            Notice {
                recipient: student_id,
                kind: NotificationKind::ConnectionAccepted,
                title: "Request Accepted!".to_string(),
                message: "Your tutor has accepted your request. You can now book sessions."
                    .to_string(),
                related_id: Some(existing.guid.to_string()),
                action_url: Some("/student".to_string()),
            },
            db,
            bus,
        )
        .await;
    }

    bus.emit_lossy(EngageEvent::ConnectionChanged {
        student_id,
        tutor_id: caller,
        status: Some(new_status),
        timestamp: now,
    });

    Ok(ConnectionRequest {
        status: new_status,
        updated_at: now,
        ..existing
    })
}

/// Relationship guard used by the session scheduler and task tracker.
/// None means no row exists for the pair.
pub async fn query_status(
    student_id: Uuid,
    tutor_id: Uuid,
    db: &SqlitePool,
) -> Result<Option<ConnectionStatus>> {
    Ok(find_pair(student_id, tutor_id, db).await?.map(|r| r.status))
}

/// Student removes the relationship entirely
///
/// Deletes the pair row from any status; subsequent session or task
/// operations against this tutor fail their relationship gate.
pub async fn disconnect(caller: Uuid, tutor_id: Uuid, db: &SqlitePool, bus: &EventBus) -> Result<()> {
    let result = sqlx::query(
        "DELETE FROM connection_requests WHERE student_id = ? AND tutor_id = ?",
    )
    .bind(caller.to_string())
    .bind(tutor_id.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "No connection with tutor {}",
            tutor_id
        )));
    }

    bus.emit_lossy(EngageEvent::ConnectionChanged {
        student_id: caller,
        tutor_id,
        status: None,
        timestamp: Utc::now(),
    });

    Ok(())
}

/// Connection rows where the caller occupies `side`, newest first
pub async fn list_connections(
    caller: Uuid,
    side: Side,
    status: Option<ConnectionStatus>,
    db: &SqlitePool,
) -> Result<Vec<ConnectionRequest>> {
    let column = match side {
        Side::Student => "student_id",
        Side::Tutor => "tutor_id",
    };

    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT * FROM connection_requests
                 WHERE {} = ? AND status = ? ORDER BY created_at DESC",
                column
            ))
            .bind(caller.to_string())
            .bind(status.as_str())
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT * FROM connection_requests WHERE {} = ? ORDER BY created_at DESC",
                column
            ))
            .bind(caller.to_string())
            .fetch_all(db)
            .await?
        }
    };

    rows.iter().map(ConnectionRequest::from_row).collect()
}

async fn find_pair(
    student_id: Uuid,
    tutor_id: Uuid,
    db: &SqlitePool,
) -> Result<Option<ConnectionRequest>> {
    let row = sqlx::query(
        "SELECT * FROM connection_requests WHERE student_id = ? AND tutor_id = ?",
    )
    .bind(student_id.to_string())
    .bind(tutor_id.to_string())
    .fetch_optional(db)
    .await?;

    row.as_ref().map(ConnectionRequest::from_row).transpose()
}
