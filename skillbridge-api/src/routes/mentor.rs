/// Mentor endpoints: task creation, listing, review queue, evaluation
///
/// # Endpoints
///
/// - `POST /mentor/task/create` - post a new task with a rubric
/// - `GET /mentor/tasks` - the mentor's own tasks, all statuses
/// - `GET /mentor/submissions` - submissions against the mentor's tasks
/// - `POST /mentor/task/:id/status` - publish or close a task
/// - `POST /mentor/evaluate/:submission_id` - record scores and feedback
///
/// Every handler gates on the mentor role at entry; evaluation additionally
/// requires ownership of the parent task.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillbridge_shared::{
    auth::Principal,
    models::{
        submission::{Evaluation, MentorSubmission, ScoreMap, Submission, SubmissionStatus},
        task::{CreateTask, RubricItem, Task, TaskStatus},
        user::Role,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create-task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Full description
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    /// Submission deadline
    pub deadline: DateTime<Utc>,

    /// Total points; defaults to the rubric sum
    pub total_points: Option<i32>,

    /// Tags for the browse view
    #[serde(default)]
    pub tags: Vec<String>,

    /// Ordered evaluation rubric
    #[serde(default)]
    pub rubric: Vec<RubricItem>,
}

/// Evaluate request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// Per-criterion scores keyed by rubric index
    #[serde(default)]
    pub scores: ScoreMap,

    /// Feedback for the student
    #[serde(default)]
    pub feedback: String,

    /// Total score as judged by the mentor; accepted as supplied, by
    /// convention the sum of `scores` bounded by the rubric maxima
    pub total_score: i32,
}

/// Review-queue filter
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionsQuery {
    /// When `submitted`, restricts the result to the review queue
    pub status: Option<SubmissionStatus>,
}

/// Task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub message: String,
    pub task: Task,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
}

/// Submission list response
#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub success: bool,
    pub submissions: Vec<MentorSubmission>,
}

/// Evaluation response
#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub success: bool,
    pub message: String,
    pub submission: Submission,
}

/// Creates a new task owned by the calling mentor
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a mentor
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    principal.require(Role::Mentor)?;
    req.validate().map_err(ApiError::from_validation)?;

    let rubric_sum: i32 = req.rubric.iter().map(|item| item.points).sum();
    let total_points = req.total_points.unwrap_or(if rubric_sum > 0 {
        rubric_sum
    } else {
        100
    });

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            deadline: req.deadline,
            total_points,
            tags: req.tags,
            mentor_id: principal.id,
            rubric: req.rubric,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, mentor_id = %principal.id, "Task created");

    Ok(Json(TaskResponse {
        success: true,
        message: "Task created".to_string(),
        task,
    }))
}

/// Lists the calling mentor's tasks across all statuses
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<TaskListResponse>> {
    principal.require(Role::Mentor)?;

    let tasks = Task::list_by_mentor(&state.db, principal.id).await?;

    Ok(Json(TaskListResponse {
        success: true,
        tasks,
    }))
}

/// Lists submissions against the calling mentor's tasks
///
/// With `?status=submitted` only the review queue is returned.
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SubmissionsQuery>,
) -> ApiResult<Json<SubmissionListResponse>> {
    principal.require(Role::Mentor)?;

    let only_submitted = query.status == Some(SubmissionStatus::Submitted);
    let submissions = Submission::list_for_mentor(&state.db, principal.id, only_submitted).await?;

    Ok(Json(SubmissionListResponse {
        success: true,
        submissions,
    }))
}

/// Status-transition request
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: TaskStatus,
}

/// Moves a task between lifecycle statuses
///
/// Ownership is part of the UPDATE's WHERE clause, so a non-owning mentor
/// and a missing task both come back as no match.
pub async fn set_task_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    principal.require(Role::Mentor)?;

    let task = Task::set_status(&state.db, task_id, principal.id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, status = %task.status.as_str(), "Task status changed");

    Ok(Json(TaskResponse {
        success: true,
        message: "Task updated".to_string(),
        task,
    }))
}

/// Records an evaluation for a submitted piece of work
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a mentor, or does not own the task
/// - `404 Not Found`: submission absent
/// - `409 Conflict`: the submission is not in the `submitted` state
pub async fn evaluate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<EvaluateRequest>,
) -> ApiResult<Json<EvaluationResponse>> {
    principal.require(Role::Mentor)?;

    let submission = Submission::find_by_id(&state.db, submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let task = Task::find_by_id(&state.db, submission.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if task.mentor_id != principal.id {
        return Err(ApiError::Forbidden(
            "Only the task's mentor can evaluate its submissions".to_string(),
        ));
    }

    let evaluation = Evaluation {
        scores: req.scores,
        feedback: req.feedback,
        total_score: req.total_score,
    };

    // The status precondition is re-checked in the UPDATE itself, so a
    // concurrent review cannot slip through between the read and the write.
    let submission = Submission::review(&state.db, submission_id, evaluation)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Only submitted work can be evaluated".to_string())
        })?;

    tracing::info!(
        submission_id = %submission_id,
        mentor_id = %principal.id,
        total_score = submission.total_score,
        "Submission evaluated"
    );

    Ok(Json(EvaluationResponse {
        success: true,
        message: "Evaluation submitted".to_string(),
        submission,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_request_validation() {
        let valid: CreateTaskRequest = serde_json::from_str(
            r#"{
                "title": "Build a search engine",
                "description": "Index and rank",
                "deadline": "2026-10-01T00:00:00Z",
                "tags": ["search"],
                "rubric": [
                    {"criteria": "X", "points": 60},
                    {"criteria": "Y", "points": 40}
                ]
            }"#,
        )
        .unwrap();
        assert!(valid.validate().is_ok());

        let empty_title: CreateTaskRequest = serde_json::from_str(
            r#"{"title": "", "description": "d", "deadline": "2026-10-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(empty_title.validate().is_err());
    }

    #[test]
    fn test_evaluate_request_accepts_index_keyed_scores() {
        let req: EvaluateRequest = serde_json::from_str(
            r#"{"scores": {"0": 55, "1": 35}, "feedback": "solid", "totalScore": 90}"#,
        )
        .unwrap();

        assert_eq!(req.scores.get("0"), Some(&55));
        assert_eq!(req.scores.get("1"), Some(&35));
        assert_eq!(req.total_score, 90);
    }
}
