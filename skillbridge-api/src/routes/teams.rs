/// Team coordination endpoints
///
/// # Endpoints
///
/// - `POST /team/create` - create a team, caller becomes leader
/// - `POST /team/join` - join by invite code
/// - `GET /team/:id` - team with members resolved to display fields
/// - `POST /team/:id/leave` - leave, with leader succession or disband
///
/// The join/leave mutations rely on store-level serialization (conditional
/// update, row lock) rather than membership checks in handler code; see the
/// team model for the invariants.

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
        team::{Team, TeamDetail},
        user::Role,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create-team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    /// Team name
    #[validate(length(min = 1, max = 100, message = "Team name must be 1-100 characters"))]
    pub name: String,
}

/// Join-team request
#[derive(Debug, Deserialize)]
pub struct JoinTeamRequest {
    /// Invite code
    pub code: String,
}

/// Team response
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub success: bool,
    pub message: String,
    pub team: Team,
}

/// Team detail response (read-side join)
#[derive(Debug, Serialize)]
pub struct TeamDetailResponse {
    pub success: bool,
    pub team: TeamDetail,
}

/// Leave response
#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub success: bool,
    pub message: String,

    /// The team after the departure, absent when it was disbanded
    pub team: Option<Team>,

    /// True when the departure disbanded the team
    pub deleted: bool,
}

/// Creates a team with the calling student as sole member and leader
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a student
/// - `503 Service Unavailable`: code generation exhausted its retries
pub async fn create_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<Json<TeamResponse>> {
    principal.require(Role::Student)?;
    req.validate().map_err(ApiError::from_validation)?;

    let team = Team::create(&state.db, &req.name, principal.id).await?;

    tracing::info!(team_id = %team.id, code = %team.code, "Team created");

    Ok(Json(TeamResponse {
        success: true,
        message: "Team created".to_string(),
        team,
    }))
}

/// Joins a team by invite code
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a student
/// - `404 Not Found`: no team has that code (any shape of bad code)
/// - `409 Conflict`: caller is already a member
pub async fn join_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<JoinTeamRequest>,
) -> ApiResult<Json<TeamResponse>> {
    principal.require(Role::Student)?;

    let code = req.code.trim().to_uppercase();

    let team = Team::join(&state.db, &code, principal.id).await?;

    let Some(team) = team else {
        // The conditional update matched nothing: unknown code, or the
        // caller is already in the member list.
        return match Team::find_by_code(&state.db, &code).await? {
            Some(_) => Err(ApiError::Conflict("Already a member".to_string())),
            None => Err(ApiError::NotFound("Invalid team code".to_string())),
        };
    };

    tracing::info!(team_id = %team.id, user_id = %principal.id, "Member joined team");

    Ok(Json(TeamResponse {
        success: true,
        message: "Joined team successfully".to_string(),
        team,
    }))
}

/// Fetches a team with members and leader resolved to display fields
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TeamDetailResponse>> {
    let team = Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let detail = team.detail(&state.db).await?;

    Ok(Json(TeamDetailResponse {
        success: true,
        team: detail,
    }))
}

/// Removes the caller from a team
///
/// When the leader leaves, leadership passes to the earliest-joined
/// remaining member; when the last member leaves, the team is deleted.
pub async fn leave_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LeaveResponse>> {
    principal.require(Role::Student)?;

    let outcome = Team::leave(&state.db, id, principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let message = if outcome.deleted {
        tracing::info!(team_id = %id, "Team disbanded");
        "Team deleted".to_string()
    } else {
        tracing::info!(team_id = %id, user_id = %principal.id, "Member left team");
        "Left team successfully".to_string()
    };

    Ok(Json(LeaveResponse {
        success: true,
        message,
        team: outcome.team,
        deleted: outcome.deleted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_team_request_validation() {
        let valid = CreateTeamRequest {
            name: "Alpha".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty = CreateTeamRequest {
            name: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}
