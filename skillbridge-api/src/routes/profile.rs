/// Student profile and dashboard endpoints
///
/// # Endpoints
///
/// - `GET /student/profile` - fetch the caller's profile
/// - `POST /student/profile/update` - update profile fields
/// - `GET /student/dashboard` - submissions plus completed/active counts

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use skillbridge_shared::{
    auth::Principal,
    models::{
        submission::{StudentSubmission, Submission},
        user::{UpdateProfile, User},
    },
};

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: User,
}

/// Dashboard statistics
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    /// Submissions that have been reviewed
    pub tasks_completed: usize,

    /// Submissions still pending or awaiting review
    pub tasks_active: usize,
}

/// Dashboard response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
    pub submissions: Vec<StudentSubmission>,
}

/// Fetches the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}

/// Updates the caller's profile fields
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<UpdateProfile>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::update_profile(&state.db, principal.id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}

/// Returns the caller's submissions with summary statistics
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<DashboardResponse>> {
    let submissions = Submission::list_by_student(&state.db, principal.id).await?;

    let tasks_completed = submissions
        .iter()
        .filter(|s| !s.submission.status.is_active())
        .count();
    let tasks_active = submissions.len() - tasks_completed;

    Ok(Json(DashboardResponse {
        success: true,
        stats: DashboardStats {
            tasks_completed,
            tasks_active,
        },
        submissions,
    }))
}
