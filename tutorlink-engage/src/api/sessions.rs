//! Session scheduling endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::connections::Side;
use crate::sessions::{self, NewSession, SessionDecision, SessionFilter};
use crate::AppState;
use tutorlink_common::db::models::TutoringSession;

use super::{ApiResult, CallerId};

/// POST /api/sessions
pub async fn request_session(
    State(state): State<AppState>,
    caller: CallerId,
    Json(body): Json<NewSession>,
) -> ApiResult<Json<TutoringSession>> {
    let session = sessions::request_session(caller.0, body, &state.db, &state.bus).await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub decision: SessionDecision,
}

/// POST /api/sessions/:id/respond
pub async fn respond_to_session(
    State(state): State<AppState>,
    caller: CallerId,
    Path(session_id): Path<Uuid>,
    Json(body): Json<RespondBody>,
) -> ApiResult<Json<TutoringSession>> {
    let session =
        sessions::respond_to_session(caller.0, session_id, body.decision, &state.db, &state.bus)
            .await?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/complete
pub async fn complete_session(
    State(state): State<AppState>,
    caller: CallerId,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<TutoringSession>> {
    let session = sessions::complete_session(caller.0, session_id, &state.db, &state.bus).await?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/cancel
pub async fn cancel_session(
    State(state): State<AppState>,
    caller: CallerId,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<TutoringSession>> {
    let session = sessions::cancel_session(caller.0, session_id, &state.db, &state.bus).await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub role: Side,
    #[serde(default = "default_filter")]
    pub filter: SessionFilter,
}

fn default_filter() -> SessionFilter {
    SessionFilter::All
}

/// GET /api/sessions?role=student|tutor&filter=upcoming|completed|pending|all
pub async fn list_sessions(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<TutoringSession>>> {
    let rows = sessions::list_sessions(caller.0, query.role, query.filter, &state.db).await?;
    Ok(Json(rows))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    caller: CallerId,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<TutoringSession>> {
    let session = sessions::get_session(caller.0, session_id, &state.db).await?;
    Ok(Json(session))
}
