//! Event types for the TutorLink engagement service
//!
//! Provides the shared `EngageEvent` definitions and the `EventBus` used to
//! push entity changes to live subscribers (SSE connections).

use crate::db::models::{ConnectionStatus, NotificationKind, SessionStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Engagement lifecycle events
///
/// Events are broadcast via EventBus after a successful store write and can
/// be serialized for SSE transmission. Every variant carries enough party
/// identifiers for a subscriber-side visibility filter, plus the emit
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngageEvent {
    /// Connection request created, answered, or removed
    ///
    /// Triggers:
    /// - SSE: Refresh connection dashboards on both sides
    ///
    /// `status` is None when the row was removed (student disconnect).
    ConnectionChanged {
        student_id: Uuid,
        tutor_id: Uuid,
        status: Option<ConnectionStatus>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Tutoring session created or transitioned
    ///
    /// Triggers:
    /// - SSE: Refresh session lists / upcoming views for both parties
    SessionChanged {
        session_id: Uuid,
        student_id: Uuid,
        tutor_id: Uuid,
        status: SessionStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Task assigned or completion flag flipped
    ///
    /// Triggers:
    /// - SSE: Refresh task lists for both parties
    TaskChanged {
        task_id: Uuid,
        student_id: Uuid,
        tutor_id: Uuid,
        is_completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Notification row appended
    ///
    /// Triggers:
    /// - SSE: Bump the recipient's unread badge without a refetch cycle
    NotificationCreated {
        notification_id: Uuid,
        user_id: Uuid,
        kind: NotificationKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Message stored in a direct thread or group conversation
    ///
    /// Triggers:
    /// - SSE: Append to an open thread; clients with the thread open
    ///   re-invoke the thread read-mark on receipt
    MessageReceived {
        message_id: Uuid,
        sender_id: Uuid,
        recipient_id: Option<Uuid>,
        group_id: Option<Uuid>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl EngageEvent {
    /// Event type name as transmitted in the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            EngageEvent::ConnectionChanged { .. } => "ConnectionChanged",
            EngageEvent::SessionChanged { .. } => "SessionChanged",
            EngageEvent::TaskChanged { .. } => "TaskChanged",
            EngageEvent::NotificationCreated { .. } => "NotificationCreated",
            EngageEvent::MessageReceived { .. } => "MessageReceived",
        }
    }

    /// Whether `user` is a party to this event
    ///
    /// Used by the SSE surface to filter the broadcast stream down to the
    /// rows a connected caller may see. Group messages are visible to any
    /// subscriber whose membership was established at subscribe time, so
    /// they are matched by the caller's group list, not here.
    pub fn concerns_user(&self, user: Uuid) -> bool {
        match self {
            EngageEvent::ConnectionChanged {
                student_id,
                tutor_id,
                ..
            } => *student_id == user || *tutor_id == user,
            EngageEvent::SessionChanged {
                student_id,
                tutor_id,
                ..
            } => *student_id == user || *tutor_id == user,
            EngageEvent::TaskChanged {
                student_id,
                tutor_id,
                ..
            } => *student_id == user || *tutor_id == user,
            EngageEvent::NotificationCreated { user_id, .. } => *user_id == user,
            EngageEvent::MessageReceived {
                sender_id,
                recipient_id,
                ..
            } => *sender_id == user || *recipient_id == Some(user),
        }
    }

    /// Group this event belongs to, if it is a group-conversation event
    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            EngageEvent::MessageReceived { group_id, .. } => *group_id,
            _ => None,
        }
    }
}

/// Broadcast bus for engagement events
///
/// Wraps `tokio::sync::broadcast`. Subscription teardown is simply dropping
/// the receiver; a receiver that falls behind skips missed events and keeps
/// going.
pub struct EventBus {
    tx: broadcast::Sender<EngageEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EngageEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if none are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EngageEvent,
    ) -> Result<usize, broadcast::error::SendError<EngageEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// The lifecycle operations use this form: pushing a change event must
    /// never fail the write that triggered it.
    pub fn emit_lossy(&self, event: EngageEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Channel capacity this bus was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
