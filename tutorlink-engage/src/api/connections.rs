//! Connection lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::connections::{self, ConnectionDecision, Side};
use crate::AppState;
use tutorlink_common::db::models::{ConnectionRequest, ConnectionStatus};

use super::{ApiResult, CallerId};

#[derive(Debug, Deserialize)]
pub struct RequestConnectionBody {
    pub tutor_id: Uuid,
    #[serde(default)]
    pub message: String,
}

/// POST /api/connections/request
pub async fn request_connection(
    State(state): State<AppState>,
    caller: CallerId,
    Json(body): Json<RequestConnectionBody>,
) -> ApiResult<Json<ConnectionRequest>> {
    let request = connections::request_connection(
        caller.0,
        body.tutor_id,
        &body.message,
        &state.db,
        &state.bus,
    )
    .await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub decision: ConnectionDecision,
}

/// POST /api/connections/:user_id/respond (user = the requesting student)
pub async fn respond_to_connection(
    State(state): State<AppState>,
    caller: CallerId,
    Path(student_id): Path<Uuid>,
    Json(body): Json<RespondBody>,
) -> ApiResult<Json<ConnectionRequest>> {
    let request = connections::respond_to_connection(
        caller.0,
        student_id,
        body.decision,
        &state.db,
        &state.bus,
    )
    .await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub student_id: Uuid,
    pub tutor_id: Uuid,
}

/// GET /api/connections/status?student_id=..&tutor_id=..
///
/// Reports "none" when no row exists for the pair.
pub async fn connection_status(
    State(state): State<AppState>,
    _caller: CallerId,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Value>> {
    let status = connections::query_status(query.student_id, query.tutor_id, &state.db).await?;
    let status = status.map(|s| s.as_str()).unwrap_or("none");
    Ok(Json(json!({ "status": status })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub role: Side,
    pub status: Option<ConnectionStatus>,
}

/// GET /api/connections?role=student|tutor&status=..
pub async fn list_connections(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ConnectionRequest>>> {
    let rows =
        connections::list_connections(caller.0, query.role, query.status, &state.db).await?;
    Ok(Json(rows))
}

/// DELETE /api/connections/:user_id (user = the tutor to disconnect from)
pub async fn disconnect(
    State(state): State<AppState>,
    caller: CallerId,
    Path(tutor_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    connections::disconnect(caller.0, tutor_id, &state.db, &state.bus).await?;
    Ok(Json(json!({ "status": "disconnected" })))
}
