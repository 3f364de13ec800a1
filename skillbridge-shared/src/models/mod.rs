/// Data models for skillbridge
///
/// Each model owns its table's queries; invariants that matter under
/// concurrency (unique invite codes, the one-submission-per-student guard,
/// counter increments, leader succession) are enforced by the store through
/// unique indexes, conditional updates, and row locks rather than by
/// check-then-act logic in handlers.
///
/// # Models
///
/// - [`user`]: student and mentor accounts with role and profile
/// - [`task`]: mentor-posted project briefs with rubrics and counters
/// - [`team`]: student teams with invite codes and leader succession
/// - [`submission`]: the apply → submit → review state machine

pub mod submission;
pub mod task;
pub mod team;
pub mod user;

pub use submission::{Submission, SubmissionStatus};
pub use task::{Task, TaskStatus};
pub use team::Team;
pub use user::{Role, User};
