//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently on every start. All timestamps are written by the
//! application as UTC values; the schema declares no time defaults so a
//! single encoding is guaranteed across every row.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_profiles_table(&pool).await?;
    create_connection_requests_table(&pool).await?;
    create_tutoring_sessions_table(&pool).await?;
    create_tasks_table(&pool).await?;
    create_notifications_table(&pool).await?;
    create_messages_table(&pool).await?;
    create_group_members_table(&pool).await?;

    Ok(pool)
}

/// Create the profiles table
///
/// Profiles are written by the account flows outside this service; the
/// engagement core reads them for existence/role checks. The aggregate
/// columns (average_rating, sessions_completed) are likewise recomputed
/// elsewhere.
async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            guid TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'student',
            is_available INTEGER NOT NULL DEFAULT 1,
            average_rating REAL,
            sessions_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the connection_requests table
///
/// The UNIQUE(student_id, tutor_id) constraint backs the one-row-per-pair
/// invariant; re-requests after rejection update the existing row.
async fn create_connection_requests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS connection_requests (
            guid TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES profiles(guid),
            tutor_id TEXT NOT NULL REFERENCES profiles(guid),
            status TEXT NOT NULL DEFAULT 'pending',
            message TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(student_id, tutor_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_connection_requests_tutor
         ON connection_requests(tutor_id, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the tutoring_sessions table
async fn create_tutoring_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tutoring_sessions (
            guid TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES profiles(guid),
            tutor_id TEXT NOT NULL REFERENCES profiles(guid),
            subject TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            scheduled_at TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 60,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tutoring_sessions_student
         ON tutoring_sessions(student_id, status)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tutoring_sessions_tutor
         ON tutoring_sessions(tutor_id, status)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tutoring_sessions_scheduled
         ON tutoring_sessions(scheduled_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the tasks table
async fn create_tasks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            guid TEXT PRIMARY KEY,
            tutor_id TEXT NOT NULL REFERENCES profiles(guid),
            student_id TEXT NOT NULL REFERENCES profiles(guid),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            due_date TEXT NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_student ON tasks(student_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_tutor ON tasks(tutor_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the notifications table
///
/// Append-only: rows are inserted by lifecycle transitions and updated
/// only to flip is_read/read_at. No deletion path exists.
async fn create_notifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES profiles(guid),
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            related_id TEXT,
            action_url TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            read_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notifications_user
         ON notifications(user_id, is_read)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notifications_user_created
         ON notifications(user_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the messages table
///
/// The CHECK constraint enforces the direct/group shape: direct messages
/// carry a recipient, group messages carry a group. group_id is an opaque
/// reference into the external group service, so it carries no FK.
async fn create_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            guid TEXT PRIMARY KEY,
            sender_id TEXT NOT NULL REFERENCES profiles(guid),
            recipient_id TEXT REFERENCES profiles(guid),
            group_id TEXT,
            kind TEXT NOT NULL,
            content TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            read_at TEXT,
            created_at TEXT NOT NULL,
            CHECK (
                (kind = 'direct' AND recipient_id IS NOT NULL)
                OR (kind = 'group' AND group_id IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_recipient
         ON messages(recipient_id, is_read)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_group
         ON messages(group_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_pair
         ON messages(sender_id, recipient_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the group_members table
///
/// Interface boundary of the external group service: this core only asks
/// "is user U a member of group G". Join/leave/invite flows live elsewhere.
async fn create_group_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_members (
            group_id TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES profiles(guid),
            joined_at TEXT NOT NULL,
            PRIMARY KEY (group_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
