//! Session scheduler
//!
//! Creates and transitions tutoring-session records between a connected
//! pair. Who initiates decides the starting status: a tutor schedules
//! directly into confirmed, a student's request starts pending and waits
//! for the tutor's answer. Completed, cancelled and rejected are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tutorlink_common::db::models::{
    ConnectionStatus, NotificationKind, SessionStatus, TutoringSession,
};
use tutorlink_common::events::{EngageEvent, EventBus};
use tutorlink_common::{ids, Error, Result};
use uuid::Uuid;

use crate::connections::{self, Side};
use crate::notifications::{self, Notice};

/// Tutor's answer to a pending session request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionDecision {
    Confirm,
    Reject,
}

/// List-query shape for session views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFilter {
    /// Confirmed sessions scheduled after now, soonest first
    Upcoming,
    /// Completed sessions, most recent first
    Completed,
    /// Requests still awaiting the tutor, newest first
    Pending,
    /// Everything, most recent first
    All,
}

/// Parameters for creating a session
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
}

fn default_duration() -> i64 {
    60
}

/// Starting status depends on which party creates the session
fn initial_status(caller: Uuid, req: &NewSession) -> SessionStatus {
    if caller == req.tutor_id {
        SessionStatus::Confirmed
    } else {
        SessionStatus::Pending
    }
}

/// Create a session between a connected pair
///
/// The caller must be one of the two parties, the scheduled time must be
/// in the future, and the pair must hold an accepted connection. The
/// non-initiating party is notified.
pub async fn request_session(
    caller: Uuid,
    req: NewSession,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<TutoringSession> {
    if caller != req.tutor_id && caller != req.student_id {
        return Err(Error::Forbidden(
            "Caller is not a party to this session".to_string(),
        ));
    }
    if req.tutor_id == req.student_id {
        return Err(Error::InvalidInput(
            "Tutor and student must be different users".to_string(),
        ));
    }
    if req.subject.trim().is_empty() {
        return Err(Error::InvalidInput("Subject is required".to_string()));
    }
    if req.duration_minutes <= 0 {
        return Err(Error::InvalidInput(
            "Session duration must be positive".to_string(),
        ));
    }

    let now = Utc::now();
    if req.scheduled_at <= now {
        return Err(Error::InvalidInput(
            "Cannot schedule sessions in the past".to_string(),
        ));
    }

    let status = connections::query_status(req.student_id, req.tutor_id, db).await?;
    if status != Some(ConnectionStatus::Accepted) {
        return Err(Error::StateConflict(
            "No accepted connection between student and tutor".to_string(),
        ));
    }

    let guid = ids::generate();
    let initial = initial_status(caller, &req);
    sqlx::query(
        "INSERT INTO tutoring_sessions
         (guid, student_id, tutor_id, subject, description, scheduled_at,
          duration_minutes, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(guid.to_string())
    .bind(req.student_id.to_string())
    .bind(req.tutor_id.to_string())
    .bind(&req.subject)
    .bind(&req.description)
    .bind(req.scheduled_at)
    .bind(req.duration_minutes)
    .bind(initial.as_str())
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    let when = req.scheduled_at.format("%Y-%m-%d %H:%M UTC");
    let notice = if initial == SessionStatus::Confirmed {
        Notice {
            recipient: req.student_id,
            kind: NotificationKind::SessionScheduled,
            title: "New Session Scheduled".to_string(),
            message: format!("Your tutor scheduled a session for {}.", when),
            related_id: Some(guid.to_string()),
            action_url: Some("/student/sessions".to_string()),
        }
    } else {
        Notice {
            recipient: req.tutor_id,
            kind: NotificationKind::SessionRequest,
            title: "New Session Request".to_string(),
            message: format!("A student requested a session for {}.", when),
            related_id: Some(guid.to_string()),
            action_url: Some("/tutor/sessions".to_string()),
        }
    };
    notifications::notify_best_effort(notice, db, bus).await;

    bus.emit_lossy(EngageEvent::SessionChanged {
        session_id: guid,
        student_id: req.student_id,
        tutor_id: req.tutor_id,
        status: initial,
        timestamp: now,
    });

    Ok(TutoringSession {
        guid,
        student_id: req.student_id,
        tutor_id: req.tutor_id,
        subject: req.subject,
        description: req.description,
        scheduled_at: req.scheduled_at,
        duration_minutes: req.duration_minutes,
        status: initial,
        created_at: now,
        updated_at: now,
    })
}

/// Tutor confirms or rejects a pending session request
pub async fn respond_to_session(
    caller: Uuid,
    session_id: Uuid,
    decision: SessionDecision,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<TutoringSession> {
    let session = fetch_session(session_id, db).await?;
    if caller != session.tutor_id {
        return Err(Error::Forbidden(
            "Only the session's tutor may respond".to_string(),
        ));
    }
    if session.status != SessionStatus::Pending {
        return Err(Error::StateConflict(format!(
            "Session is {}, not pending",
            session.status.as_str()
        )));
    }

    let new_status = match decision {
        SessionDecision::Confirm => SessionStatus::Confirmed,
        SessionDecision::Reject => SessionStatus::Rejected,
    };
    let updated = transition(&session, new_status, db, bus).await?;

    let notice = match decision {
        SessionDecision::Confirm => Notice {
            recipient: session.student_id,
            kind: NotificationKind::SessionConfirmed,
            title: "Session Request Accepted".to_string(),
            message: format!("Your session request for {} was accepted.", session.subject),
            related_id: Some(session.guid.to_string()),
            action_url: Some("/student/sessions".to_string()),
        },
        SessionDecision::Reject => Notice {
            recipient: session.student_id,
            kind: NotificationKind::SessionRejected,
            title: "Session Request Declined".to_string(),
            message: format!("Your session request for {} was declined.", session.subject),
            related_id: Some(session.guid.to_string()),
            action_url: Some("/student/sessions".to_string()),
        },
    };
    notifications::notify_best_effort(notice, db, bus).await;

    Ok(updated)
}

/// Tutor marks a confirmed session as delivered
///
/// Profile aggregates (sessions_completed, average_rating) are recomputed
/// by out-of-scope flows, not here.
pub async fn complete_session(
    caller: Uuid,
    session_id: Uuid,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<TutoringSession> {
    let session = fetch_session(session_id, db).await?;
    if caller != session.tutor_id {
        return Err(Error::Forbidden(
            "Only the session's tutor may complete it".to_string(),
        ));
    }
    if session.status != SessionStatus::Confirmed {
        return Err(Error::StateConflict(format!(
            "Session is {}, only confirmed sessions can be completed",
            session.status.as_str()
        )));
    }

    transition(&session, SessionStatus::Completed, db, bus).await
}

/// Either party cancels a session that has not yet settled
pub async fn cancel_session(
    caller: Uuid,
    session_id: Uuid,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<TutoringSession> {
    let session = fetch_session(session_id, db).await?;
    if caller != session.tutor_id && caller != session.student_id {
        return Err(Error::Forbidden(
            "Caller is not a party to this session".to_string(),
        ));
    }
    if session.status.is_terminal() {
        return Err(Error::StateConflict(format!(
            "Session is already {}",
            session.status.as_str()
        )));
    }

    let updated = transition(&session, SessionStatus::Cancelled, db, bus).await?;

    // Notify whichever party did not initiate the cancellation
    let (recipient, action_url) = if caller == session.tutor_id {
        (session.student_id, "/student/sessions")
    } else {
        (session.tutor_id, "/tutor/sessions")
    };
    let when = session.scheduled_at.format("%Y-%m-%d %H:%M UTC");
    notifications::notify_best_effort(
        Notice {
            recipient,
            kind: NotificationKind::SessionCancelled,
            title: "Session Cancelled".to_string(),
            message: format!(
                "The {} session scheduled for {} was cancelled.",
                session.subject, when
            ),
            related_id: Some(session.guid.to_string()),
            action_url: Some(action_url.to_string()),
        },
        db,
        bus,
    )
    .await;

    Ok(updated)
}

/// Session views for one side of the pair
pub async fn list_sessions(
    caller: Uuid,
    side: Side,
    filter: SessionFilter,
    db: &SqlitePool,
) -> Result<Vec<TutoringSession>> {
    let column = match side {
        Side::Student => "student_id",
        Side::Tutor => "tutor_id",
    };

    let rows = match filter {
        SessionFilter::Upcoming => {
            sqlx::query(&format!(
                "SELECT * FROM tutoring_sessions
                 WHERE {} = ? AND status = 'confirmed' AND scheduled_at > ?
                 ORDER BY scheduled_at ASC",
                column
            ))
            .bind(caller.to_string())
            .bind(Utc::now())
            .fetch_all(db)
            .await?
        }
        SessionFilter::Completed => {
            sqlx::query(&format!(
                "SELECT * FROM tutoring_sessions
                 WHERE {} = ? AND status = 'completed'
                 ORDER BY scheduled_at DESC",
                column
            ))
            .bind(caller.to_string())
            .fetch_all(db)
            .await?
        }
        SessionFilter::Pending => {
            sqlx::query(&format!(
                "SELECT * FROM tutoring_sessions
                 WHERE {} = ? AND status = 'pending'
                 ORDER BY created_at DESC",
                column
            ))
            .bind(caller.to_string())
            .fetch_all(db)
            .await?
        }
        SessionFilter::All => {
            sqlx::query(&format!(
                "SELECT * FROM tutoring_sessions WHERE {} = ? ORDER BY scheduled_at DESC",
                column
            ))
            .bind(caller.to_string())
            .fetch_all(db)
            .await?
        }
    };

    rows.iter().map(TutoringSession::from_row).collect()
}

/// Fetch one session; only its parties may read it
pub async fn get_session(caller: Uuid, session_id: Uuid, db: &SqlitePool) -> Result<TutoringSession> {
    let session = fetch_session(session_id, db).await?;
    if caller != session.tutor_id && caller != session.student_id {
        return Err(Error::Forbidden(
            "Caller is not a party to this session".to_string(),
        ));
    }
    Ok(session)
}

async fn fetch_session(session_id: Uuid, db: &SqlitePool) -> Result<TutoringSession> {
    let row = sqlx::query("SELECT * FROM tutoring_sessions WHERE guid = ?")
        .bind(session_id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session not found: {}", session_id)))?;
    TutoringSession::from_row(&row)
}

/// Write a status transition and emit SessionChanged
async fn transition(
    session: &TutoringSession,
    new_status: SessionStatus,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<TutoringSession> {
    let now = Utc::now();
    sqlx::query("UPDATE tutoring_sessions SET status = ?, updated_at = ? WHERE guid = ?")
        .bind(new_status.as_str())
        .bind(now)
        .bind(session.guid.to_string())
        .execute(db)
        .await?;

    bus.emit_lossy(EngageEvent::SessionChanged {
        session_id: session.guid,
        student_id: session.student_id,
        tutor_id: session.tutor_id,
        status: new_status,
        timestamp: now,
    });

    Ok(TutoringSession {
        status: new_status,
        updated_at: now,
        ..session.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request(tutor: Uuid, student: Uuid) -> NewSession {
        NewSession {
            tutor_id: tutor,
            student_id: student,
            subject: "Calculus".to_string(),
            description: String::new(),
            scheduled_at: Utc::now() + chrono::Duration::days(1),
            duration_minutes: 60,
        }
    }

    #[test]
    fn tutor_initiated_sessions_start_confirmed() {
        let tutor = Uuid::new_v4();
        let student = Uuid::new_v4();
        let req = sample_request(tutor, student);
        assert_eq!(initial_status(tutor, &req), SessionStatus::Confirmed);
    }

    #[test]
    fn student_initiated_sessions_start_pending() {
        let tutor = Uuid::new_v4();
        let student = Uuid::new_v4();
        let req = sample_request(tutor, student);
        assert_eq!(initial_status(student, &req), SessionStatus::Pending);
    }

    #[test]
    fn new_session_defaults_apply() {
        let json = format!(
            r#"{{"tutor_id":"{}","student_id":"{}","subject":"Algebra","scheduled_at":"2031-05-01T10:00:00Z"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let req: NewSession = serde_json::from_str(&json).unwrap();
        assert_eq!(req.duration_minutes, 60);
        assert_eq!(req.description, "");
    }

    #[test]
    fn filter_deserializes_snake_case() {
        let f: SessionFilter = serde_json::from_str("\"upcoming\"").unwrap();
        assert_eq!(f, SessionFilter::Upcoming);
        let f: SessionFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(f, SessionFilter::All);
    }
}
