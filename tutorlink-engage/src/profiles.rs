//! Profile reads
//!
//! Profiles are owned by the account flows outside this service. The
//! engagement core only reads them: existence/role checks before creating
//! a connection, and a read-only fetch for the API.

use sqlx::SqlitePool;
use tutorlink_common::db::models::Profile;
use tutorlink_common::{Error, Result};
use uuid::Uuid;

/// Look up a profile, returning None when the row does not exist
pub async fn find_profile(user_id: Uuid, db: &SqlitePool) -> Result<Option<Profile>> {
    let row = sqlx::query("SELECT * FROM profiles WHERE guid = ?")
        .bind(user_id.to_string())
        .fetch_optional(db)
        .await?;

    row.as_ref().map(Profile::from_row).transpose()
}

/// Fetch a profile, failing with NotFound when the row does not exist
pub async fn get_profile(user_id: Uuid, db: &SqlitePool) -> Result<Profile> {
    find_profile(user_id, db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Profile not found: {}", user_id)))
}
