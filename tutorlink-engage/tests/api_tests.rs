//! Integration tests for the HTTP surface
//!
//! Drives `build_router` directly with tower `oneshot` requests: identity
//! extraction, JSON bodies, the error-to-status mapping, and a connection
//! flow exercised entirely over HTTP.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use tutorlink_common::db::init_database;
use tutorlink_common::events::EventBus;
use tutorlink_engage::{build_router, AppState};
use uuid::Uuid;

async fn setup_app() -> (axum::Router, SqlitePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tutorlink.db"))
        .await
        .unwrap();
    let state = AppState::new(pool.clone(), Arc::new(EventBus::new(100)));
    (build_router(state), pool, dir)
}

async fn seed_profile(db: &SqlitePool, role: &str) -> Uuid {
    let guid = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO profiles (guid, full_name, role, created_at, updated_at)
         VALUES (?, 'Test User', ?, ?, ?)",
    )
    .bind(guid.to_string())
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(db)
    .await
    .unwrap();
    guid
}

fn request_as(user: Uuid, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user.to_string());
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_identity() {
    let (app, _db, _dir) = setup_app().await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tutorlink-engage");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn api_routes_require_the_identity_header() {
    let (app, _db, _dir) = setup_app().await;

    let anonymous = Request::builder()
        .uri("/api/notifications/unread-count")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(anonymous).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let malformed = Request::builder()
        .uri("/api/notifications/unread-count")
        .header("x-user-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(malformed).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn connection_flow_over_http() {
    let (app, db, _dir) = setup_app().await;
    let student = seed_profile(&db, "student").await;
    let tutor = seed_profile(&db, "tutor").await;

    // Student requests the connection
    let response = app
        .clone()
        .oneshot(request_as(
            student,
            "POST",
            "/api/connections/request",
            Some(json!({ "tutor_id": tutor, "message": "help with calculus" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "help with calculus");

    // Duplicate request maps to 409
    let response = app
        .clone()
        .oneshot(request_as(
            student,
            "POST",
            "/api/connections/request",
            Some(json!({ "tutor_id": tutor, "message": "again" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());

    // Tutor accepts
    let response = app
        .clone()
        .oneshot(request_as(
            tutor,
            "POST",
            &format!("/api/connections/{}/respond", student),
            Some(json!({ "decision": "accept" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "accepted");

    // Status query reflects it
    let response = app
        .clone()
        .oneshot(request_as(
            student,
            "GET",
            &format!(
                "/api/connections/status?student_id={}&tutor_id={}",
                student, tutor
            ),
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "accepted");

    // The tutor picked up a notification along the way
    let response = app
        .clone()
        .oneshot(request_as(
            tutor,
            "GET",
            "/api/notifications/unread-count",
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["unread"], 1);
}

#[tokio::test]
async fn session_errors_map_to_their_status_codes() {
    let (app, db, _dir) = setup_app().await;
    let student = seed_profile(&db, "student").await;
    let tutor = seed_profile(&db, "tutor").await;
    let tomorrow = Utc::now() + Duration::days(1);

    // No accepted connection: 409
    let response = app
        .clone()
        .oneshot(request_as(
            student,
            "POST",
            "/api/sessions",
            Some(json!({
                "tutor_id": tutor,
                "student_id": student,
                "subject": "Calculus",
                "scheduled_at": tomorrow.to_rfc3339(),
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Past date: 400, checked before the relationship gate
    let yesterday = Utc::now() - Duration::days(1);
    let response = app
        .clone()
        .oneshot(request_as(
            student,
            "POST",
            "/api/sessions",
            Some(json!({
                "tutor_id": tutor,
                "student_id": student,
                "subject": "Calculus",
                "scheduled_at": yesterday.to_rfc3339(),
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown session id: 404
    let response = app
        .clone()
        .oneshot(request_as(
            tutor,
            "GET",
            &format!("/api/sessions/{}", Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_body_must_name_exactly_one_target() {
    let (app, db, _dir) = setup_app().await;
    let alice = seed_profile(&db, "both").await;
    let bob = seed_profile(&db, "both").await;

    let neither = app
        .clone()
        .oneshot(request_as(
            alice,
            "POST",
            "/api/messages",
            Some(json!({ "content": "hi" })),
        ))
        .await
        .unwrap();
    assert_eq!(neither.status(), StatusCode::BAD_REQUEST);

    let both = app
        .clone()
        .oneshot(request_as(
            alice,
            "POST",
            "/api/messages",
            Some(json!({
                "recipient_id": bob,
                "group_id": Uuid::new_v4(),
                "content": "hi"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(both.status(), StatusCode::BAD_REQUEST);

    let direct = app
        .clone()
        .oneshot(request_as(
            alice,
            "POST",
            "/api/messages",
            Some(json!({ "recipient_id": bob, "content": "hi" })),
        ))
        .await
        .unwrap();
    assert_eq!(direct.status(), StatusCode::OK);
    let body = extract_json(direct.into_body()).await;
    assert_eq!(body["kind"], "direct");
    assert_eq!(body["content"], "hi");
}

#[tokio::test]
async fn thread_read_and_unread_count_round_trip_over_http() {
    let (app, db, _dir) = setup_app().await;
    let alice = seed_profile(&db, "both").await;
    let bob = seed_profile(&db, "both").await;

    for body in ["one", "two"] {
        let response = app
            .clone()
            .oneshot(request_as(
                bob,
                "POST",
                "/api/messages",
                Some(json!({ "recipient_id": alice, "content": body })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request_as(alice, "GET", "/api/messages/unread-count", None))
        .await
        .unwrap();
    let count = extract_json(response.into_body()).await;
    assert_eq!(count["unread"], 2);

    let response = app
        .clone()
        .oneshot(request_as(
            alice,
            "POST",
            &format!("/api/messages/thread/{}/read", bob),
            None,
        ))
        .await
        .unwrap();
    let marked = extract_json(response.into_body()).await;
    assert_eq!(marked["marked"], 2);

    let response = app
        .clone()
        .oneshot(request_as(alice, "GET", "/api/messages/unread-count", None))
        .await
        .unwrap();
    let count = extract_json(response.into_body()).await;
    assert_eq!(count["unread"], 0);
}

#[tokio::test]
async fn profile_fetch_returns_typed_row() {
    let (app, db, _dir) = setup_app().await;
    let caller = seed_profile(&db, "student").await;
    let tutor = seed_profile(&db, "tutor").await;

    let response = app
        .clone()
        .oneshot(request_as(
            caller,
            "GET",
            &format!("/api/profiles/{}", tutor),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["guid"], tutor.to_string());
    assert_eq!(body["role"], "tutor");

    let missing = app
        .oneshot(request_as(
            caller,
            "GET",
            &format!("/api/profiles/{}", Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
