//! Notification endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::notifications;
use crate::AppState;
use tutorlink_common::db::models::Notification;

use super::{ApiResult, CallerId};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// GET /api/notifications?limit=..
pub async fn list_notifications(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let rows = notifications::list_notifications(caller.0, query.limit, &state.db).await?;
    Ok(Json(rows))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CallerId,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = notifications::mark_read(caller.0, notification_id, &state.db).await?;
    Ok(Json(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Json<Value>> {
    let marked = notifications::mark_all_read(caller.0, &state.db).await?;
    Ok(Json(json!({ "marked": marked })))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Json<Value>> {
    let unread = notifications::count_unread(caller.0, &state.db).await?;
    Ok(Json(json!({ "unread": unread })))
}
