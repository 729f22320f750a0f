//! Integration tests for notification dispatch and read tracking
//!
//! Covers the append path, the best-effort contract (a failed notification
//! write never fails the triggering operation), recipient-only read
//! marking, the bulk read path, and the unread badge counter.

use chrono::Utc;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tutorlink_common::db::init_database;
use tutorlink_common::db::models::{ConnectionStatus, NotificationKind};
use tutorlink_common::events::EventBus;
use tutorlink_common::Error;
use tutorlink_engage::notifications::{self, Notice};
use tutorlink_engage::connections;
use uuid::Uuid;

async fn setup_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tutorlink.db"))
        .await
        .unwrap();
    (pool, dir)
}

async fn seed_profile(db: &SqlitePool, role: &str) -> Uuid {
    let guid = Uuid::new_v4();
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
    .execute(db)
    .await
    .unwrap();
    guid
}

fn notice_for(recipient: Uuid, kind: NotificationKind) -> Notice {
    Notice {
        recipient,
        kind,
        title: "Test".to_string(),
        message: "Test body".to_string(),
        related_id: None,
        action_url: None,
    }
}

#[tokio::test]
async fn notify_appends_unread_row_and_emits_event() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let mut rx = bus.subscribe();
    let user = seed_profile(&db, "student").await;

    let created = notifications::notify(
        notice_for(user, NotificationKind::SessionScheduled),
        &db,
        &bus,
    )
    .await
    .unwrap();
    assert!(!created.is_read);
    assert_eq!(created.read_at, None);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.event_type(), "NotificationCreated");
    assert!(event.concerns_user(user));

    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_dispatch_produces_duplicate_rows() {
    // No deduplication: a double-submit of a triggering operation lands
    // twice.
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let user = seed_profile(&db, "student").await;

    let notice = notice_for(user, NotificationKind::NewMessage);
    notifications::notify(notice.clone(), &db, &bus).await.unwrap();
    notifications::notify(notice, &db, &bus).await.unwrap();

    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 2);
}

#[tokio::test]
async fn failed_notification_write_does_not_fail_the_lifecycle() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let student = seed_profile(&db, "student").await;
    let tutor = seed_profile(&db, "tutor").await;

    // Break the notification store out from under the dispatcher. The
    // primary connection_requests write must still land.
    sqlx::query("DROP TABLE notifications")
        .execute(&db)
        .await
        .unwrap();

    let request = connections::request_connection(student, tutor, "hello", &db, &bus)
        .await
        .unwrap();
    assert_eq!(request.status, ConnectionStatus::Pending);

    let status = connections::query_status(student, tutor, &db).await.unwrap();
    assert_eq!(status, Some(ConnectionStatus::Pending));
}

#[tokio::test]
async fn mark_read_is_recipient_only() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let user = seed_profile(&db, "student").await;
    let other = seed_profile(&db, "student").await;

    let created = notifications::notify(
        notice_for(user, NotificationKind::ConnectionAccepted),
        &db,
        &bus,
    )
    .await
    .unwrap();

    // Someone else's attempt does not find the row
    let denied = notifications::mark_read(other, created.guid, &db).await;
    assert!(matches!(denied, Err(Error::NotFound(_))));
    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 1);

    let marked = notifications::mark_read(user, created.guid, &db)
        .await
        .unwrap();
    assert!(marked.is_read);
    assert!(marked.read_at.is_some());
    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 0);
}

#[tokio::test]
async fn mark_all_read_zeroes_the_badge() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let user = seed_profile(&db, "student").await;

    for kind in [
        NotificationKind::ConnectionRequest,
        NotificationKind::SessionScheduled,
        NotificationKind::TaskAssigned,
    ] {
        notifications::notify(notice_for(user, kind), &db, &bus)
            .await
            .unwrap();
    }
    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 3);

    let marked = notifications::mark_all_read(user, &db).await.unwrap();
    assert_eq!(marked, 3);
    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 0);

    // Already-clean state marks nothing further
    let again = notifications::mark_all_read(user, &db).await.unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn mark_all_read_leaves_other_users_alone() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let user = seed_profile(&db, "student").await;
    let other = seed_profile(&db, "student").await;

    notifications::notify(notice_for(user, NotificationKind::NewMessage), &db, &bus)
        .await
        .unwrap();
    notifications::notify(notice_for(other, NotificationKind::NewMessage), &db, &bus)
        .await
        .unwrap();

    notifications::mark_all_read(user, &db).await.unwrap();
    assert_eq!(notifications::count_unread(user, &db).await.unwrap(), 0);
    assert_eq!(notifications::count_unread(other, &db).await.unwrap(), 1);
}

#[tokio::test]
async fn listing_is_newest_first_and_bounded() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let user = seed_profile(&db, "student").await;

    for i in 0..5 {
        let mut notice = notice_for(user, NotificationKind::NewMessage);
        notice.message = format!("message {}", i);
        notifications::notify(notice, &db, &bus).await.unwrap();
        // Distinct created_at values so ordering is deterministic
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let listed = notifications::list_notifications(user, None, &db)
        .await
        .unwrap();
    assert_eq!(listed.len(), 5);
    assert!(listed
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));

    let limited = notifications::list_notifications(user, Some(2), &db)
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].message, "message 4");
}

#[tokio::test]
async fn opaque_fields_are_returned_verbatim() {
    let (db, _dir) = setup_db().await;
    let bus = EventBus::new(100);
    let user = seed_profile(&db, "student").await;

    let created = notifications::notify(
        Notice {
            recipient: user,
            kind: NotificationKind::GroupInvite,
            title: "Invite".to_string(),
            message: "You were invited".to_string(),
            related_id: Some("group:42".to_string()),
            action_url: Some("/groups/42?tab=chat".to_string()),
        },
        &db,
        &bus,
    )
    .await
    .unwrap();

    let listed = notifications::list_notifications(user, None, &db)
        .await
        .unwrap();
    assert_eq!(listed[0].guid, created.guid);
    assert_eq!(listed[0].related_id.as_deref(), Some("group:42"));
    assert_eq!(listed[0].action_url.as_deref(), Some("/groups/42?tab=chat"));
}
