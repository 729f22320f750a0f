//! Messaging channel
//!
//! Direct (1:1) threads and group conversations, independent of the
//! connection lifecycle: any two profiles can message. Read tracking
//! exists for direct messages only; group messages carry no per-recipient
//! state. Sending stores the row and pushes a MessageReceived event, with
//! no notification fan-out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tutorlink_common::db::models::Message;
use tutorlink_common::events::{EngageEvent, EventBus};
use tutorlink_common::{ids, Error, Result};
use uuid::Uuid;

use crate::groups;
use crate::profiles;

/// Where a message is going: a direct counterparty or a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Direct(Uuid),
    Group(Uuid),
}

/// One entry in the caller's conversation index: the counterparty, the
/// latest direct message either way, and how many of their messages the
/// caller has not read yet.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub counterparty_id: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub last_sender_id: Uuid,
    pub unread_count: i64,
}

/// Store a message and push it to live subscribers
pub async fn send_message(
    caller: Uuid,
    target: MessageTarget,
    content: &str,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<Message> {
    if content.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Message content is empty".to_string(),
        ));
    }

    let (recipient_id, group_id, kind) = match target {
        MessageTarget::Direct(recipient) => {
            if recipient == caller {
                return Err(Error::InvalidInput(
                    "Cannot message yourself".to_string(),
                ));
            }
            if profiles::find_profile(recipient, db).await?.is_none() {
                return Err(Error::NotFound(format!(
                    "Recipient profile not found: {}",
                    recipient
                )));
            }
            (Some(recipient), None, "direct")
        }
        MessageTarget::Group(group) => {
            groups::require_member(caller, group, db).await?;
            (None, Some(group), "group")
        }
    };

    let guid = ids::generate();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO messages
         (guid, sender_id, recipient_id, group_id, kind, content, is_read, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(guid.to_string())
    .bind(caller.to_string())
    .bind(recipient_id.map(|u| u.to_string()))
    .bind(group_id.map(|u| u.to_string()))
    .bind(kind)
    .bind(content)
    .bind(now)
    .execute(db)
    .await?;

    bus.emit_lossy(EngageEvent::MessageReceived {
        message_id: guid,
        sender_id: caller,
        recipient_id,
        group_id,
        timestamp: now,
    });

    Ok(Message {
        guid,
        sender_id: caller,
        recipient_id,
        group_id,
        kind: tutorlink_common::db::models::MessageKind::parse(kind)?,
        content: content.to_string(),
        is_read: false,
        read_at: None,
        created_at: now,
    })
}

/// Both directions of a direct thread, oldest first
pub async fn fetch_direct_thread(
    caller: Uuid,
    counterparty: Uuid,
    db: &SqlitePool,
) -> Result<Vec<Message>> {
    let rows = sqlx::query(
        "SELECT * FROM messages
         WHERE kind = 'direct'
           AND ((sender_id = ? AND recipient_id = ?)
             OR (sender_id = ? AND recipient_id = ?))
         ORDER BY created_at ASC",
    )
    .bind(caller.to_string())
    .bind(counterparty.to_string())
    .bind(counterparty.to_string())
    .bind(caller.to_string())
    .fetch_all(db)
    .await?;

    rows.iter().map(Message::from_row).collect()
}

/// A group's conversation, oldest first, members only
pub async fn fetch_group_thread(
    caller: Uuid,
    group_id: Uuid,
    db: &SqlitePool,
) -> Result<Vec<Message>> {
    groups::require_member(caller, group_id, db).await?;

    let rows = sqlx::query(
        "SELECT * FROM messages
         WHERE kind = 'group' AND group_id = ?
         ORDER BY created_at ASC LIMIT 100",
    )
    .bind(group_id.to_string())
    .fetch_all(db)
    .await?;

    rows.iter().map(Message::from_row).collect()
}

/// Mark every unread message sent to the caller by `counterparty` as read
///
/// Touches only that one direction of that one thread; messages involving
/// third parties are never affected. Returns the number of rows marked.
pub async fn mark_thread_read(
    caller: Uuid,
    counterparty: Uuid,
    db: &SqlitePool,
) -> Result<u64> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE messages SET is_read = 1, read_at = ?
         WHERE kind = 'direct' AND recipient_id = ? AND sender_id = ? AND is_read = 0",
    )
    .bind(now)
    .bind(caller.to_string())
    .bind(counterparty.to_string())
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

/// The caller's conversation index, most recent thread first
///
/// Materialized at query time from the direct messages the caller is a
/// party to: one entry per counterparty with the latest message and the
/// caller's unread count for that thread.
pub async fn list_conversations(caller: Uuid, db: &SqlitePool) -> Result<Vec<ConversationSummary>> {
    let rows = sqlx::query(
        "SELECT * FROM messages
         WHERE kind = 'direct' AND (sender_id = ? OR recipient_id = ?)
         ORDER BY created_at DESC",
    )
    .bind(caller.to_string())
    .bind(caller.to_string())
    .fetch_all(db)
    .await?;

    let mut summaries: Vec<ConversationSummary> = Vec::new();
    for row in &rows {
        let message = Message::from_row(row)?;
        let counterparty = if message.sender_id == caller {
            match message.recipient_id {
                Some(recipient) => recipient,
                None => continue,
            }
        } else {
            message.sender_id
        };

        let unread_here =
            (message.recipient_id == Some(caller) && !message.is_read) as i64;
        match summaries
            .iter_mut()
            .find(|s| s.counterparty_id == counterparty)
        {
            Some(summary) => summary.unread_count += unread_here,
            // Rows arrive newest-first, so the first sighting of a
            // counterparty is their latest message.
            None => summaries.push(ConversationSummary {
                counterparty_id: counterparty,
                last_message: message.content.clone(),
                last_message_at: message.created_at,
                last_sender_id: message.sender_id,
                unread_count: unread_here,
            }),
        }
    }

    Ok(summaries)
}

/// Unread direct messages addressed to the caller, for the nav badge
pub async fn count_unread_messages(caller: Uuid, db: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages
         WHERE kind = 'direct' AND recipient_id = ? AND is_read = 0",
    )
    .bind(caller.to_string())
    .fetch_one(db)
    .await?;

    Ok(count)
}
