//! Profile read endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::profiles;
use crate::AppState;
use tutorlink_common::db::models::Profile;

use super::{ApiResult, CallerId};

/// GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    _caller: CallerId,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Profile>> {
    let profile = profiles::get_profile(user_id, &state.db).await?;
    Ok(Json(profile))
}
