/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation for both roles
/// - JWT token generation
/// - API client helpers
///
/// Tests are skipped (return early) when `DATABASE_URL` is not set, so the
/// unit test suite stays runnable without a live PostgreSQL.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use skillbridge_api::app::{build_router, AppState};
use skillbridge_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use skillbridge_shared::auth::jwt::{create_token, Claims, TokenType};
use skillbridge_shared::models::user::{CreateUser, Role, User};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration-test-secret-key-0123456789abcdef";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub mentor: User,
    pub student: User,
    pub mentor_token: String,
    pub student_token: String,
}

impl TestContext {
    /// Creates a new test context against the configured database
    ///
    /// Returns `None` when `DATABASE_URL` is unset.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        dotenvy::dotenv().ok();

        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping integration test");
            return Ok(None);
        };

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
        };

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let mentor = create_user(&db, "Test Mentor", Role::Mentor).await?;
        let student = create_user(&db, "Test Student", Role::Student).await?;

        let mentor_token = token_for(&mentor, &config.jwt.secret)?;
        let student_token = token_for(&student, &config.jwt.secret)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(Some(TestContext {
            db,
            app,
            config,
            mentor,
            student,
            mentor_token,
            student_token,
        }))
    }

    /// Sends a POST with a JSON body, returning status and parsed body
    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        send(self.app.clone(), request).await
    }

    /// Sends a GET, returning status and parsed body
    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        send(self.app.clone(), request).await
    }

    /// Cleans up test data
    ///
    /// Deletes the context's users plus any extras created by the test;
    /// tasks and submissions cascade, teams are removed by membership first
    /// because `leader_id` does not cascade.
    pub async fn cleanup(&self, extra_user_ids: &[Uuid]) -> anyhow::Result<()> {
        let mut ids = vec![self.mentor.id, self.student.id];
        ids.extend_from_slice(extra_user_ids);

        sqlx::query("DELETE FROM teams WHERE members && $1")
            .bind(&ids)
            .execute(&self.db)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

/// Sends a POST against an owned router handle
///
/// Takes owned arguments so callers can move it into spawned tasks when a
/// test needs genuinely concurrent requests.
pub async fn post_json(
    app: axum::Router,
    uri: String,
    token: String,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, request).await
}

/// Creates a user with a unique email
pub async fn create_user(db: &PgPool, name: &str, role: Role) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            name: name.to_string(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            // Login is not exercised through these accounts
            password_hash: "test_hash".to_string(),
            role,
        },
    )
    .await?;

    Ok(user)
}

/// Mints an access token for a user
pub fn token_for(user: &User, secret: &str) -> anyhow::Result<String> {
    let claims = Claims::new(user.id, user.role, TokenType::Access);
    Ok(create_token(&claims, secret)?)
}

async fn send(mut app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    (status, json)
}
