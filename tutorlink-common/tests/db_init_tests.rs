//! Integration tests for database initialization
//!
//! Covers automatic creation on first run, idempotent re-initialization,
//! and the schema constraints the lifecycle invariants lean on.

use chrono::Utc;
use tempfile::TempDir;
use tutorlink_common::db::init_database;
use uuid::Uuid;

async fn setup_db() -> (sqlx::SqlitePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tutorlink.db"))
        .await
        .unwrap();
    (pool, dir)
}

async fn insert_profile(pool: &sqlx::SqlitePool, guid: Uuid, role: &str) {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO profiles (guid, full_name, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(guid.to_string())
    .bind("Test User")
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn database_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tutorlink.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "database file was not created");
}

#[tokio::test]
async fn database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tutorlink.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Second init must be a no-op open, not a failure
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "failed to reopen: {:?}", pool2.err());
}

#[tokio::test]
async fn schema_tables_exist() {
    let (pool, _dir) = setup_db().await;

    for table in [
        "profiles",
        "connection_requests",
        "tutoring_sessions",
        "tasks",
        "notifications",
        "messages",
        "group_members",
    ] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn connection_pair_uniqueness_enforced() {
    let (pool, _dir) = setup_db().await;
    let student = Uuid::new_v4();
    let tutor = Uuid::new_v4();
    insert_profile(&pool, student, "student").await;
    insert_profile(&pool, tutor, "tutor").await;

    let now = Utc::now();
    let insert = "INSERT INTO connection_requests
                  (guid, student_id, tutor_id, status, message, created_at, updated_at)
                  VALUES (?, ?, ?, 'pending', '', ?, ?)";

    sqlx::query(insert)
        .bind(Uuid::new_v4().to_string())
        .bind(student.to_string())
        .bind(tutor.to_string())
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();

    // Second row for the same (student, tutor) pair must violate UNIQUE
    let duplicate = sqlx::query(insert)
        .bind(Uuid::new_v4().to_string())
        .bind(student.to_string())
        .bind(tutor.to_string())
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await;
    assert!(duplicate.is_err(), "duplicate pair row was accepted");
}

#[tokio::test]
async fn message_shape_check_enforced() {
    let (pool, _dir) = setup_db().await;
    let sender = Uuid::new_v4();
    insert_profile(&pool, sender, "student").await;

    // Direct message without a recipient violates the CHECK constraint
    let bad = sqlx::query(
        "INSERT INTO messages (guid, sender_id, kind, content, created_at)
         VALUES (?, ?, 'direct', 'hi', ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(sender.to_string())
    .bind(Utc::now())
    .execute(&pool)
    .await;
    assert!(bad.is_err(), "direct message without recipient was accepted");

    // Group message with a group_id passes
    let ok = sqlx::query(
        "INSERT INTO messages (guid, sender_id, group_id, kind, content, created_at)
         VALUES (?, ?, ?, 'group', 'hi all', ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(sender.to_string())
    .bind(Uuid::new_v4().to_string())
    .bind(Utc::now())
    .execute(&pool)
    .await;
    assert!(ok.is_ok(), "group message rejected: {:?}", ok.err());
}

#[tokio::test]
async fn bound_timestamps_round_trip() {
    let (pool, _dir) = setup_db().await;
    let guid = Uuid::new_v4();
    let written = Utc::now();

    sqlx::query(
        "INSERT INTO profiles (guid, full_name, role, created_at, updated_at)
         VALUES (?, 'Clock Check', 'both', ?, ?)",
    )
    .bind(guid.to_string())
    .bind(written)
    .bind(written)
    .execute(&pool)
    .await
    .unwrap();

    let read: chrono::DateTime<Utc> =
        sqlx::query_scalar("SELECT created_at FROM profiles WHERE guid = ?")
            .bind(guid.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(read, written);
}
