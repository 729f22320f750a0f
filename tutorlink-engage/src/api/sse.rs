//! Server-Sent Events endpoint
//!
//! Streams EngageEvents to the connected caller, filtered to what they may
//! see: events they are a party to, plus group-message events for groups
//! they belonged to when the stream was opened. Dropping the connection
//! drops the broadcast receiver, which is the entire unsubscribe path.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::groups;
use crate::AppState;
use tutorlink_common::events::EngageEvent;

use super::{ApiError, CallerId};

/// GET /api/events
pub async fn event_stream(
    State(state): State<AppState>,
    caller: CallerId,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Group visibility is fixed at subscribe time; a client that joins a
    // new group reconnects to pick it up.
    let member_groups = groups::member_groups(caller.0, &state.db).await?;

    let rx = state.bus.subscribe();
    info!(
        "SSE client connected for {}, total subscribers: {}",
        caller.0,
        state.bus.subscriber_count()
    );

    let user = caller.0;
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let member_groups = member_groups.clone();
        async move {
            match result {
                Ok(event) => {
                    if !visible_to(&event, user, &member_groups) {
                        return None;
                    }
                    Event::default()
                        .event(event.event_type())
                        .json_data(&event)
                        .ok()
                        .map(Ok)
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("SSE subscriber for {} lagged, skipped {} events", user, skipped);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Per-caller visibility filter over the shared broadcast stream
fn visible_to(event: &EngageEvent, user: Uuid, member_groups: &[Uuid]) -> bool {
    if event.concerns_user(user) {
        return true;
    }
    match event.group_id() {
        Some(group) => member_groups.contains(&group),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tutorlink_common::db::models::NotificationKind;

    #[test]
    fn own_notification_is_visible() {
        let user = Uuid::new_v4();
        let event = EngageEvent::NotificationCreated {
            notification_id: Uuid::new_v4(),
            user_id: user,
            kind: NotificationKind::TaskAssigned,
            timestamp: Utc::now(),
        };
        assert!(visible_to(&event, user, &[]));
        assert!(!visible_to(&event, Uuid::new_v4(), &[]));
    }

    #[test]
    fn group_message_visible_to_members_only() {
        let group = Uuid::new_v4();
        let event = EngageEvent::MessageReceived {
            message_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            recipient_id: None,
            group_id: Some(group),
            timestamp: Utc::now(),
        };
        let member = Uuid::new_v4();
        assert!(visible_to(&event, member, &[group]));
        assert!(!visible_to(&event, member, &[Uuid::new_v4()]));
        assert!(!visible_to(&event, member, &[]));
    }
}
