//! Task tracker
//!
//! Homework items a tutor assigns to a connected student. Completion is a
//! single idempotent flag; either party of the task may flip it, and no
//! record is kept of who did.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tutorlink_common::db::models::{ConnectionStatus, NotificationKind, Task};
use tutorlink_common::events::{EngageEvent, EventBus};
use tutorlink_common::{ids, Error, Result};
use uuid::Uuid;

use crate::connections;
use crate::notifications::{self, Notice};

/// Parameters for assigning a task
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub student_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
}

/// Tutor assigns a task to a connected student
pub async fn assign_task(
    caller: Uuid,
    req: NewTask,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<Task> {
    if req.title.trim().is_empty() {
        return Err(Error::InvalidInput("Title is required".to_string()));
    }

    let status = connections::query_status(req.student_id, caller, db).await?;
    if status != Some(ConnectionStatus::Accepted) {
        return Err(Error::StateConflict(
            "No accepted connection with this student".to_string(),
        ));
    }

    let guid = ids::generate();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO tasks
         (guid, tutor_id, student_id, title, description, due_date,
          is_completed, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(guid.to_string())
    .bind(caller.to_string())
    .bind(req.student_id.to_string())
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.due_date)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    notifications::notify_best_effort(
        Notice {
            recipient: req.student_id,
            kind: NotificationKind::TaskAssigned,
            title: "New Task Assigned".to_string(),
            message: format!("Your tutor assigned: {}", req.title),
            related_id: Some(guid.to_string()),
            action_url: Some("/student/tasks".to_string()),
        },
        db,
        bus,
    )
    .await;

    bus.emit_lossy(EngageEvent::TaskChanged {
        task_id: guid,
        student_id: req.student_id,
        tutor_id: caller,
        is_completed: false,
        timestamp: now,
    });

    Ok(Task {
        guid,
        tutor_id: caller,
        student_id: req.student_id,
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        is_completed: false,
        created_at: now,
        updated_at: now,
    })
}

/// Flip the completion flag; idempotent, party-only, no notification
pub async fn set_completion(
    caller: Uuid,
    task_id: Uuid,
    completed: bool,
    db: &SqlitePool,
    bus: &EventBus,
) -> Result<Task> {
    let task = fetch_task(task_id, db).await?;
    if caller != task.student_id && caller != task.tutor_id {
        return Err(Error::Forbidden(
            "Caller is not a party to this task".to_string(),
        ));
    }

    let now = Utc::now();
    sqlx::query("UPDATE tasks SET is_completed = ?, updated_at = ? WHERE guid = ?")
        .bind(completed as i64)
        .bind(now)
        .bind(task.guid.to_string())
        .execute(db)
        .await?;

    bus.emit_lossy(EngageEvent::TaskChanged {
        task_id: task.guid,
        student_id: task.student_id,
        tutor_id: task.tutor_id,
        is_completed: completed,
        timestamp: now,
    });

    Ok(Task {
        is_completed: completed,
        updated_at: now,
        ..task
    })
}

/// Tasks of one (tutor, student) pair, earliest due date first.
/// Readable only by a member of the pair.
pub async fn list_tasks(
    caller: Uuid,
    tutor_id: Uuid,
    student_id: Uuid,
    db: &SqlitePool,
) -> Result<Vec<Task>> {
    if caller != tutor_id && caller != student_id {
        return Err(Error::Forbidden(
            "Caller is not a party to these tasks".to_string(),
        ));
    }

    let rows = sqlx::query(
        "SELECT * FROM tasks WHERE tutor_id = ? AND student_id = ? ORDER BY due_date ASC",
    )
    .bind(tutor_id.to_string())
    .bind(student_id.to_string())
    .fetch_all(db)
    .await?;

    rows.iter().map(Task::from_row).collect()
}

async fn fetch_task(task_id: Uuid, db: &SqlitePool) -> Result<Task> {
    let row = sqlx::query("SELECT * FROM tasks WHERE guid = ?")
        .bind(task_id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Task not found: {}", task_id)))?;
    Task::from_row(&row)
}
