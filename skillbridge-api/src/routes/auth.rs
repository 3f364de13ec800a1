/// Identity gate endpoints
///
/// # Endpoints
///
/// - `POST /signup` - register as student or mentor
/// - `POST /login` - authenticate and receive tokens
/// - `GET /logout` - stateless logout acknowledgement
/// - `POST /refresh` - exchange a refresh token for a new access token
///
/// Token lifetimes: access 24h, refresh 30d. The core never sees raw
/// passwords beyond this module; everything downstream consumes the
/// `Principal` resolved from the access token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use skillbridge_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, Role, User},
};
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength separately)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Account role; defaults to student
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Student
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,

    /// Role the client logged in as; must match the account
    pub role: Role,
}

/// Public projection of a user returned by the gate
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Signup/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: UserPublic,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

fn issue_tokens(user: &User, secret: &str) -> ApiResult<(String, String)> {
    let access_claims = jwt::Claims::new(user.id, user.role, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, user.role, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, secret)?;
    let refresh_token = jwt::create_token(&refresh_claims, secret)?;

    Ok((access_token, refresh_token))
}

/// Registers a new user
///
/// # Errors
///
/// - `409 Conflict`: email already registered (store-level unique index)
/// - `422 Unprocessable Entity`: validation failed
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password).map_err(ApiError::Validation)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "New signup");

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Signup successful".to_string(),
        user: UserPublic::from(&user),
        access_token,
        refresh_token,
    }))
}

/// Authenticates a user
///
/// The requested role must match the account's role; credentials failures
/// and role mismatches are indistinguishable to the client.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid || user.role != req.role {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: UserPublic::from(&user),
        access_token,
        refresh_token,
    }))
}

/// Stateless logout
///
/// Tokens are not tracked server-side; clients discard them.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}

/// Exchanges a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical1".to_string(),
            role: Role::Student,
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignupRequest {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            password: "analytical1".to_string(),
            role: Role::Student,
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
            role: Role::Student,
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_signup_role_defaults_to_student() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","password":"analytical1"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::Student);
    }
}
