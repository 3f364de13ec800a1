/// API route handlers
///
/// - `auth`: signup, login, logout, token refresh
/// - `health`: liveness and database connectivity
/// - `profile`: student profile and dashboard
/// - `tasks`: browse, apply, submit
/// - `teams`: create, join, inspect, leave
/// - `mentor`: task creation, listing, review queue, evaluation

pub mod auth;
pub mod health;
pub mod mentor;
pub mod profile;
pub mod tasks;
pub mod teams;
