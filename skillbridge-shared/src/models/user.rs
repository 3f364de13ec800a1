/// User model and database operations
///
/// A single `users` table holds both students and mentors; the `role` column
/// decides which side of the marketplace an account sits on. Profile fields
/// that only make sense for one role (e.g. `company` for mentors, `education`
/// for students) default to empty for the other.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('student', 'mentor');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'student',
///     ...
/// );
/// ```
///
/// The unique index on `email` is the only duplicate-signup guard; callers
/// insert and map the constraint violation to a conflict error rather than
/// probing first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Account role, fixed at signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Forms teams, applies to tasks, submits work
    Student,

    /// Posts tasks with rubrics and reviews submissions
    Mentor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model representing a student or mentor account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2id password hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role
    pub role: Role,

    /// Short biography
    pub bio: String,

    /// GitHub profile URL
    pub github_url: String,

    /// LinkedIn profile URL
    pub linkedin_url: String,

    /// Student skills
    pub skills: Vec<String>,

    /// Student education summary
    pub education: String,

    /// Mentor company
    pub company: String,

    /// Mentor job title
    pub job_role: String,

    /// Mentor areas of expertise
    pub expertise: Vec<String>,

    /// Mentor experience (free-form, e.g. "5+")
    pub years_of_experience: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user at signup
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Input for updating profile fields
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, bio, github_url, linkedin_url, \
     skills, education, company, job_role, expertise, years_of_experience, created_at";

impl User {
    /// Creates a new account
    ///
    /// # Errors
    ///
    /// Returns a database error carrying the `users_email_key` constraint
    /// when the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email (login path)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates profile fields, leaving `None` fields as they are
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                skills = COALESCE($4, skills),
                education = COALESCE($5, education),
                github_url = COALESCE($6, github_url),
                linkedin_url = COALESCE($7, linkedin_url)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.bio)
        .bind(data.skills)
        .bind(data.education)
        .bind(data.github_url)
        .bind(data.linkedin_url)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

/// Display-only projection of a user for read-side joins
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Student.as_str(), "student");
        assert_eq!(Role::Mentor.as_str(), "mentor");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Mentor).unwrap(), "\"mentor\"");
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Student,
            bio: String::new(),
            github_url: String::new(),
            linkedin_url: String::new(),
            skills: vec![],
            education: String::new(),
            company: String::new(),
            job_role: String::new(),
            expertise: vec![],
            years_of_experience: String::new(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
