//! # Skillbridge shared library
//!
//! Shared code for the skillbridge task marketplace: data models, the
//! identity gate (JWT + password hashing + axum middleware), and database
//! plumbing (pool, migrations).
//!
//! ## Modules
//!
//! - `models`: User, Task, Team, Submission and their queries
//! - `auth`: tokens, password hashing, and the request `Principal`
//! - `db`: connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;
