//! Messaging endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::messaging::{self, ConversationSummary, MessageTarget};
use crate::AppState;
use tutorlink_common::db::models::Message;
use tutorlink_common::Error;

use super::{ApiResult, CallerId};

#[derive(Debug, Deserialize)]
pub struct SendBody {
    pub recipient_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub content: String,
}

/// POST /api/messages
///
/// Exactly one of recipient_id (direct) or group_id (group) must be set.
pub async fn send_message(
    State(state): State<AppState>,
    caller: CallerId,
    Json(body): Json<SendBody>,
) -> ApiResult<Json<Message>> {
    let target = match (body.recipient_id, body.group_id) {
        (Some(recipient), None) => MessageTarget::Direct(recipient),
        (None, Some(group)) => MessageTarget::Group(group),
        _ => {
            return Err(Error::InvalidInput(
                "Provide exactly one of recipient_id or group_id".to_string(),
            )
            .into())
        }
    };

    let message =
        messaging::send_message(caller.0, target, &body.content, &state.db, &state.bus).await?;
    Ok(Json(message))
}

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
}

/// GET /api/messages/thread?user_id=.. | ?group_id=..
pub async fn fetch_thread(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<ThreadQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let rows = match (query.user_id, query.group_id) {
        (Some(counterparty), None) => {
            messaging::fetch_direct_thread(caller.0, counterparty, &state.db).await?
        }
        (None, Some(group)) => messaging::fetch_group_thread(caller.0, group, &state.db).await?,
        _ => {
            return Err(Error::InvalidInput(
                "Provide exactly one of user_id or group_id".to_string(),
            )
            .into())
        }
    };
    Ok(Json(rows))
}

/// POST /api/messages/thread/:user_id/read
pub async fn mark_thread_read(
    State(state): State<AppState>,
    caller: CallerId,
    Path(counterparty): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let marked = messaging::mark_thread_read(caller.0, counterparty, &state.db).await?;
    Ok(Json(json!({ "marked": marked })))
}

/// GET /api/messages/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let rows = messaging::list_conversations(caller.0, &state.db).await?;
    Ok(Json(rows))
}

/// GET /api/messages/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Json<Value>> {
    let unread = messaging::count_unread_messages(caller.0, &state.db).await?;
    Ok(Json(json!({ "unread": unread })))
}
