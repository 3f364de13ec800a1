/// Application state and router builder
///
/// Defines the shared application state and builds the axum router with all
/// routes and middleware.
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /signup /login /logout /refresh  # Identity gate (public)
/// ├── /student/...                   # Profile + dashboard (student)
/// ├── /tasks/...                     # Browse, apply, submit (authenticated)
/// ├── /team/...                      # Team coordination (student)
/// └── /mentor/...                    # Task creation + review (mentor)
/// ```
///
/// Everything below the identity-gate routes requires a Bearer access token;
/// the middleware resolves it into a `Principal` request extension and
/// role checks happen at the entry of each handler.

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use skillbridge_shared::auth::{jwt, Principal};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via axum's `State` extractor; `Arc` keeps the clone
/// cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes: health + identity gate
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/logout", get(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh));

    // Everything else requires a resolved principal
    let protected_routes = Router::new()
        // Student profile and dashboard
        .route("/student/profile", get(routes::profile::get_profile))
        .route("/student/profile/update", post(routes::profile::update_profile))
        .route("/student/dashboard", get(routes::profile::dashboard))
        // Task browsing and the submission lifecycle
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route("/tasks/:id/apply", post(routes::tasks::apply))
        .route("/tasks/:id/submit", post(routes::tasks::submit_work))
        // Team coordination
        .route("/team/create", post(routes::teams::create_team))
        .route("/team/join", post(routes::teams::join_team))
        .route("/team/:id", get(routes::teams::get_team))
        .route("/team/:id/leave", post(routes::teams::leave_team))
        // Mentor side
        .route("/mentor/task/create", post(routes::mentor::create_task))
        .route("/mentor/tasks", get(routes::mentor::list_tasks))
        .route("/mentor/task/:id/status", post(routes::mentor::set_task_status))
        .route("/mentor/submissions", get(routes::mentor::list_submissions))
        .route(
            "/mentor/evaluate/:submission_id",
            post(routes::mentor::evaluate),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the Bearer token from the Authorization header and injects the
/// resolved `Principal` into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(Principal::from_claims(&claims));

    Ok(next.run(req).await)
}
