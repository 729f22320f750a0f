//! Group membership boundary
//!
//! Study-group CRUD (create/join/leave/invite) lives in an external
//! service; this core only ever asks whether a user is currently a member
//! of a group before letting them touch its conversation.

use sqlx::SqlitePool;
use tutorlink_common::{Error, Result};
use uuid::Uuid;

/// Whether `user` is an active member of `group_id`
pub async fn is_member(user: Uuid, group_id: Uuid, db: &SqlitePool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM group_members WHERE group_id = ? AND user_id = ?",
    )
    .bind(group_id.to_string())
    .bind(user.to_string())
    .fetch_one(db)
    .await?;

    Ok(count > 0)
}

/// Membership gate used before any group-conversation access
pub async fn require_member(user: Uuid, group_id: Uuid, db: &SqlitePool) -> Result<()> {
    if is_member(user, group_id, db).await? {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "User is not a member of group {}",
            group_id
        )))
    }
}

/// Groups the user belongs to, used to scope the SSE stream at subscribe
/// time
pub async fn member_groups(user: Uuid, db: &SqlitePool) -> Result<Vec<Uuid>> {
    let rows: Vec<String> =
        sqlx::query_scalar("SELECT group_id FROM group_members WHERE user_id = ?")
            .bind(user.to_string())
            .fetch_all(db)
            .await?;

    rows.iter()
        .map(|s| tutorlink_common::ids::parse(s))
        .collect()
}
