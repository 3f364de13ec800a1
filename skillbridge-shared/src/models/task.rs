/// Task model and database operations
///
/// Tasks are project briefs posted by mentors. Each carries an ordered
/// rubric of scored criteria that mentors evaluate submissions against.
///
/// # Lifecycle
///
/// ```text
/// draft → active → closed
/// ```
///
/// Only the owning mentor may move a task between statuses; `mentor_id` is
/// immutable after creation.
///
/// # Counters
///
/// `applicants` counts distinct student applications. It is only ever
/// changed with an atomic `applicants = applicants + 1` inside the same
/// transaction as the submission insert (see [`crate::models::submission`]),
/// so it can never drift from the real submission count under concurrent
/// applies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Visible in the browse view, open for applications
    Active,

    /// No longer accepting applications
    Closed,

    /// Not yet published
    Draft,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Closed => "closed",
            TaskStatus::Draft => "draft",
        }
    }
}

/// One scored criterion of a task rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricItem {
    /// What is being assessed
    pub criteria: String,

    /// Maximum points for this criterion
    pub points: i32,
}

/// Task model representing a mentor-posted project brief
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Full description
    pub description: String,

    /// Submission deadline
    pub deadline: DateTime<Utc>,

    /// Total points on offer (conventionally the rubric sum)
    pub total_points: i32,

    /// Tags for filtering in the browse view
    pub tags: Vec<String>,

    /// Owning mentor (immutable)
    pub mentor_id: Uuid,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Count of distinct student applications
    pub applicants: i32,

    /// Count of teams working on the task
    pub active_teams: i32,

    /// Ordered evaluation rubric
    pub rubric: Json<Vec<RubricItem>>,

    /// When the task was posted
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub total_points: i32,
    pub tags: Vec<String>,
    pub mentor_id: Uuid,
    pub rubric: Vec<RubricItem>,
}

const TASK_COLUMNS: &str = "id, title, description, deadline, total_points, tags, mentor_id, \
     status, applicants, active_teams, rubric, created_at";

impl Task {
    /// Creates a new task in active status with zeroed counters
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, deadline, total_points, tags, mentor_id, rubric)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.total_points)
        .bind(data.tags)
        .bind(data.mentor_id)
        .bind(Json(data.rubric))
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists active tasks, newest first (general browse view)
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE status = 'active'
            ORDER BY created_at DESC
            "#,
        ))
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists a mentor's own tasks across all statuses
    pub async fn list_by_mentor(pool: &PgPool, mentor_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE mentor_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(mentor_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Transitions a task's status, gated on ownership
    ///
    /// Returns `None` when the task does not exist or the caller is not the
    /// owning mentor; ownership is part of the WHERE clause rather than a
    /// separate read.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        mentor_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $3
            WHERE id = $1 AND mentor_id = $2
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(mentor_id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }
}
