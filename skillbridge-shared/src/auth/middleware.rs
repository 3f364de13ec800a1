/// Request principal and role gating
///
/// After token validation the request carries a [`Principal`], the resolved
/// identity (user ID + role), in its extensions. Handlers extract it with
/// axum's `Extension` and gate operations by calling [`Principal::require`]
/// at entry, instead of comparing role strings inline.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use skillbridge_shared::auth::middleware::{Principal, RoleError};
/// use skillbridge_shared::models::user::Role;
///
/// async fn create_task(Extension(principal): Extension<Principal>) -> Result<(), RoleError> {
///     principal.require(Role::Mentor)?;
///     // ... mentor-only logic
///     Ok(())
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::Role;

/// The authenticated identity attached to a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user ID
    pub id: Uuid,

    /// Account role from the token
    pub role: Role,
}

/// Error for operations invoked with the wrong role
#[derive(Debug, thiserror::Error)]
#[error("This action requires the {required} role")]
pub struct RoleError {
    /// The role the operation demands
    pub required: Role,
}

impl Principal {
    /// Builds a principal from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }

    /// Requires the principal to hold the given role
    pub fn require(&self, required: Role) -> Result<(), RoleError> {
        if self.role == required {
            Ok(())
        } else {
            Err(RoleError { required })
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_mentor(&self) -> bool {
        self.role == Role::Mentor
    }
}

impl IntoResponse for RoleError {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_principal_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Role::Mentor, TokenType::Access);

        let principal = Principal::from_claims(&claims);
        assert_eq!(principal.id, user_id);
        assert!(principal.is_mentor());
        assert!(!principal.is_student());
    }

    #[test]
    fn test_require_role() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::Student,
        };

        assert!(principal.require(Role::Student).is_ok());

        let err = principal.require(Role::Mentor).unwrap_err();
        assert_eq!(err.required, Role::Mentor);
        assert_eq!(err.to_string(), "This action requires the mentor role");
    }
}
