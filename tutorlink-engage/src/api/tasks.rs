//! Task tracking endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::tasks::{self, NewTask};
use crate::AppState;
use tutorlink_common::db::models::Task;

use super::{ApiResult, CallerId};

/// POST /api/tasks
pub async fn assign_task(
    State(state): State<AppState>,
    caller: CallerId,
    Json(body): Json<NewTask>,
) -> ApiResult<Json<Task>> {
    let task = tasks::assign_task(caller.0, body, &state.db, &state.bus).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub completed: bool,
}

/// PUT /api/tasks/:id/completion
pub async fn set_completion(
    State(state): State<AppState>,
    caller: CallerId,
    Path(task_id): Path<Uuid>,
    Json(body): Json<CompletionBody>,
) -> ApiResult<Json<Task>> {
    let task =
        tasks::set_completion(caller.0, task_id, body.completed, &state.db, &state.bus).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
}

/// GET /api/tasks?tutor_id=..&student_id=..
pub async fn list_tasks(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let rows = tasks::list_tasks(caller.0, query.tutor_id, query.student_id, &state.db).await?;
    Ok(Json(rows))
}
