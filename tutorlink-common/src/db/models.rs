//! Typed entity models
//!
//! Rows are normalized into these structs exactly once, at the store
//! boundary, via the `from_row` constructors. Status columns are stored as
//! snake_case TEXT and converted through the enums here; code above the
//! store never sees raw strings.

use crate::{ids, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Role a profile can occupy in the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Tutor,
    Both,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            "both" => Ok(Role::Both),
            other => Err(Error::Internal(format!("Unknown role '{}'", other))),
        }
    }

    /// Whether this role can act as a tutor
    pub fn can_tutor(&self) -> bool {
        matches!(self, Role::Tutor | Role::Both)
    }

    /// Whether this role can act as a student
    pub fn can_study(&self) -> bool {
        matches!(self, Role::Student | Role::Both)
    }
}

/// Connection request state machine: pending -> accepted | rejected.
/// A rejected request may be re-submitted, flipping the same row back to
/// pending. "No relationship" is the absence of a row, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "rejected" => Ok(ConnectionStatus::Rejected),
            other => Err(Error::Internal(format!(
                "Unknown connection status '{}'",
                other
            ))),
        }
    }
}

/// Tutoring session state machine.
///
/// Student-initiated sessions start pending; tutor-initiated sessions start
/// confirmed. Completed, cancelled and rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "confirmed" => Ok(SessionStatus::Confirmed),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "rejected" => Ok(SessionStatus::Rejected),
            other => Err(Error::Internal(format!(
                "Unknown session status '{}'",
                other
            ))),
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Rejected
        )
    }
}

/// Notification vocabulary shared with the presentation layer.
///
/// `NewMessage`, `GroupInvite` and `ReviewReceived` are rendered by clients
/// but produced by flows outside this service; they are carried here so the
/// full vocabulary round-trips through one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ConnectionRequest,
    ConnectionAccepted,
    SessionRequest,
    SessionScheduled,
    SessionConfirmed,
    SessionRejected,
    SessionCancelled,
    TaskAssigned,
    NewMessage,
    GroupInvite,
    ReviewReceived,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ConnectionRequest => "connection_request",
            NotificationKind::ConnectionAccepted => "connection_accepted",
            NotificationKind::SessionRequest => "session_request",
            NotificationKind::SessionScheduled => "session_scheduled",
            NotificationKind::SessionConfirmed => "session_confirmed",
            NotificationKind::SessionRejected => "session_rejected",
            NotificationKind::SessionCancelled => "session_cancelled",
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::NewMessage => "new_message",
            NotificationKind::GroupInvite => "group_invite",
            NotificationKind::ReviewReceived => "review_received",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "connection_request" => Ok(NotificationKind::ConnectionRequest),
            "connection_accepted" => Ok(NotificationKind::ConnectionAccepted),
            "session_request" => Ok(NotificationKind::SessionRequest),
            "session_scheduled" => Ok(NotificationKind::SessionScheduled),
            "session_confirmed" => Ok(NotificationKind::SessionConfirmed),
            "session_rejected" => Ok(NotificationKind::SessionRejected),
            "session_cancelled" => Ok(NotificationKind::SessionCancelled),
            "task_assigned" => Ok(NotificationKind::TaskAssigned),
            "new_message" => Ok(NotificationKind::NewMessage),
            "group_invite" => Ok(NotificationKind::GroupInvite),
            "review_received" => Ok(NotificationKind::ReviewReceived),
            other => Err(Error::Internal(format!(
                "Unknown notification kind '{}'",
                other
            ))),
        }
    }
}

/// Direct (1:1) vs group conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Direct,
    Group,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Direct => "direct",
            MessageKind::Group => "group",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(MessageKind::Direct),
            "group" => Ok(MessageKind::Group),
            other => Err(Error::Internal(format!(
                "Unknown message kind '{}'",
                other
            ))),
        }
    }
}

/// Marketplace user profile. Owned by out-of-scope account flows; this
/// service reads it for existence/role checks and a read-only fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub guid: Uuid,
    pub full_name: String,
    pub role: Role,
    pub is_available: bool,
    pub average_rating: Option<f64>,
    pub sessions_completed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            guid: ids::parse(&row.try_get::<String, _>("guid")?)?,
            full_name: row.try_get("full_name")?,
            role: Role::parse(&row.try_get::<String, _>("role")?)?,
            is_available: row.try_get::<i64, _>("is_available")? != 0,
            average_rating: row.try_get("average_rating")?,
            sessions_completed: row.try_get("sessions_completed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// One row per (student, tutor) pair; the sole record of their
/// relationship. Sessions and tasks gate on this row being accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub guid: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub status: ConnectionStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRequest {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            guid: ids::parse(&row.try_get::<String, _>("guid")?)?,
            student_id: ids::parse(&row.try_get::<String, _>("student_id")?)?,
            tutor_id: ids::parse(&row.try_get::<String, _>("tutor_id")?)?,
            status: ConnectionStatus::parse(&row.try_get::<String, _>("status")?)?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A scheduled (or requested) tutoring session between a connected pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutoringSession {
    pub guid: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TutoringSession {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            guid: ids::parse(&row.try_get::<String, _>("guid")?)?,
            student_id: ids::parse(&row.try_get::<String, _>("student_id")?)?,
            tutor_id: ids::parse(&row.try_get::<String, _>("tutor_id")?)?,
            subject: row.try_get("subject")?,
            description: row.try_get("description")?,
            scheduled_at: row.try_get("scheduled_at")?,
            duration_minutes: row.try_get("duration_minutes")?,
            status: SessionStatus::parse(&row.try_get::<String, _>("status")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Homework item assigned by a tutor to a connected student.
/// Completion is a single flag; there is no in-progress state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub guid: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            guid: ids::parse(&row.try_get::<String, _>("guid")?)?,
            tutor_id: ids::parse(&row.try_get::<String, _>("tutor_id")?)?,
            student_id: ids::parse(&row.try_get::<String, _>("student_id")?)?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_date: row.try_get("due_date")?,
            is_completed: row.try_get::<i64, _>("is_completed")? != 0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Append-only per-user notification. `related_id` and `action_url` are
/// opaque references, stored and returned verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub guid: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            guid: ids::parse(&row.try_get::<String, _>("guid")?)?,
            user_id: ids::parse(&row.try_get::<String, _>("user_id")?)?,
            kind: NotificationKind::parse(&row.try_get::<String, _>("kind")?)?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            related_id: row.try_get("related_id")?,
            action_url: row.try_get("action_url")?,
            is_read: row.try_get::<i64, _>("is_read")? != 0,
            read_at: row.try_get("read_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Direct or group conversation message. Read tracking applies to direct
/// messages only; group messages carry no per-recipient read state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub guid: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub kind: MessageKind,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let recipient_id = row
            .try_get::<Option<String>, _>("recipient_id")?
            .map(|s| ids::parse(&s))
            .transpose()?;
        let group_id = row
            .try_get::<Option<String>, _>("group_id")?
            .map(|s| ids::parse(&s))
            .transpose()?;
        Ok(Self {
            guid: ids::parse(&row.try_get::<String, _>("guid")?)?,
            sender_id: ids::parse(&row.try_get::<String, _>("sender_id")?)?,
            recipient_id,
            group_id,
            kind: MessageKind::parse(&row.try_get::<String, _>("kind")?)?,
            content: row.try_get("content")?,
            is_read: row.try_get::<i64, _>("is_read")? != 0,
            read_at: row.try_get("read_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
