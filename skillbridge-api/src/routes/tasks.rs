/// Task browsing and the student side of the submission lifecycle
///
/// # Endpoints
///
/// - `GET /tasks` - browse active tasks
/// - `GET /tasks/:id` - task details
/// - `POST /tasks/:id/apply` - apply (creates the pending submission)
/// - `POST /tasks/:id/submit` - submit or resubmit work
///
/// Applying inserts the submission and increments the task's applicant
/// counter in one transaction; the second application by the same student
/// hits the (task_id, student_id) unique index and surfaces as a 409.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use skillbridge_shared::{
    auth::Principal,
    models::{
        submission::{Submission, WorkPayload},
        task::Task,
        user::Role,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Apply request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    /// Team the student applies with, if any
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

/// Submit-work request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkRequest {
    /// Repository link
    #[validate(url(message = "githubUrl must be a valid URL"))]
    pub github_url: String,

    /// Live demo link
    #[serde(default)]
    pub demo_url: String,

    /// Supporting material link
    #[serde(default)]
    pub drive_link: String,

    /// Notes to the mentor
    #[serde(default)]
    pub notes: String,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
}

/// Single task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: Task,
}

/// Submission response
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    pub submission: Submission,
}

/// Lists active tasks for the browse view
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<TaskListResponse>> {
    let tasks = Task::list_active(&state.db).await?;

    Ok(Json(TaskListResponse {
        success: true,
        tasks,
    }))
}

/// Fetches a single task
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

/// Applies the calling student to a task
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a student
/// - `404 Not Found`: task absent
/// - `409 Conflict`: already applied (idempotency guard)
pub async fn apply(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    principal.require(Role::Student)?;

    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let submission = Submission::apply(&state.db, task_id, principal.id, req.team_id).await?;

    tracing::info!(
        task_id = %task_id,
        student_id = %principal.id,
        "Student applied to task"
    );

    Ok(Json(SubmissionResponse {
        success: true,
        message: "Applied successfully".to_string(),
        submission,
    }))
}

/// Submits (or resubmits) work for a task the caller applied to
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a student
/// - `404 Not Found`: no application exists ("apply first")
/// - `409 Conflict`: the submission was already reviewed
pub async fn submit_work(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<SubmitWorkRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    principal.require(Role::Student)?;
    req.validate().map_err(ApiError::from_validation)?;

    let payload = WorkPayload {
        github_url: req.github_url,
        demo_url: req.demo_url,
        drive_link: req.drive_link,
        notes: req.notes,
    };

    let submission = Submission::record_work(&state.db, task_id, principal.id, payload).await?;

    let Some(submission) = submission else {
        // No row matched the pending/submitted precondition: either the
        // student never applied, or the mentor already reviewed.
        return match Submission::find_by_task_and_student(&state.db, task_id, principal.id).await? {
            Some(_) => Err(ApiError::Conflict(
                "Submission has already been reviewed".to_string(),
            )),
            None => Err(ApiError::NotFound(
                "Apply to this task before submitting".to_string(),
            )),
        };
    };

    tracing::info!(
        task_id = %task_id,
        student_id = %principal.id,
        "Work submitted"
    );

    Ok(Json(SubmissionResponse {
        success: true,
        message: "Submitted successfully".to_string(),
        submission,
    }))
}
