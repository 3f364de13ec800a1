/// Submission model and database operations
///
/// A submission tracks one student's engagement with one task, from
/// application through work submission to mentor review.
///
/// # State Machine
///
/// ```text
/// pending → submitted → reviewed
/// ```
///
/// Status is monotonic: it never regresses and review requires a prior
/// submission. Resubmission while still `submitted` is allowed (the payload
/// is overwritten) until the mentor reviews.
///
/// # Idempotency guard
///
/// At most one submission exists per (task_id, student_id); the unique index
/// `submissions_task_student_key` enforces this at the store, so two
/// concurrent applies produce exactly one row and one conflict. The
/// `tasks.applicants` counter is incremented in the same transaction as the
/// insert, with an atomic `applicants = applicants + 1`, keeping it equal to
/// the true application count under concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Submission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Applied, no work submitted yet
    Pending,

    /// Work submitted, awaiting review
    Submitted,

    /// Reviewed and scored by the mentor (terminal)
    Reviewed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Reviewed => "reviewed",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: SubmissionStatus) -> bool {
        match (self, target) {
            // Resubmission before review overwrites the payload
            (SubmissionStatus::Pending, SubmissionStatus::Submitted) => true,
            (SubmissionStatus::Submitted, SubmissionStatus::Submitted) => true,
            (SubmissionStatus::Submitted, SubmissionStatus::Reviewed) => true,

            // No regression, no review of unsubmitted work
            _ => false,
        }
    }

    /// Checks if the submission still counts as active work for a student
    pub fn is_active(&self) -> bool {
        matches!(self, SubmissionStatus::Pending | SubmissionStatus::Submitted)
    }
}

/// Per-criterion scores keyed by rubric index
pub type ScoreMap = BTreeMap<String, i32>;

/// Submission model tracking a student's application to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    /// Unique submission ID
    pub id: Uuid,

    /// Task applied to
    pub task_id: Uuid,

    /// Applying student
    pub student_id: Uuid,

    /// Team the student is working with, if any
    pub team_id: Option<Uuid>,

    /// Repository link
    pub github_url: String,

    /// Live demo link
    pub demo_url: String,

    /// Supporting material link
    pub drive_link: String,

    /// Free-form notes to the mentor
    pub notes: String,

    /// Lifecycle status
    pub status: SubmissionStatus,

    /// Scores keyed by rubric index, set at review
    pub scores: Json<ScoreMap>,

    /// Mentor feedback, set at review
    pub feedback: String,

    /// Total score as supplied by the mentor
    pub total_score: i32,

    /// When the student applied
    pub applied_at: DateTime<Utc>,

    /// When work was (last) submitted
    pub submitted_at: Option<DateTime<Utc>>,

    /// When the mentor reviewed
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Work payload attached when submitting
#[derive(Debug, Clone, Default)]
pub struct WorkPayload {
    pub github_url: String,
    pub demo_url: String,
    pub drive_link: String,
    pub notes: String,
}

/// Evaluation recorded by the owning mentor
///
/// `total_score` is taken as supplied rather than recomputed from `scores`;
/// by convention it equals the sum of the per-criterion scores bounded by
/// each rubric item's maximum.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub scores: ScoreMap,
    pub feedback: String,
    pub total_score: i32,
}

/// Submission joined with task display fields (student dashboard)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StudentSubmission {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,

    /// Title of the task applied to
    pub task_title: String,

    /// Deadline of the task applied to
    pub task_deadline: DateTime<Utc>,
}

/// Submission joined with student/task/team display fields (review queue)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MentorSubmission {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,

    /// Applying student's name
    pub student_name: String,

    /// Applying student's email
    pub student_email: String,

    /// Title of the task submitted against
    pub task_title: String,

    /// Team name, when the work was done in a team
    pub team_name: Option<String>,
}

const SUBMISSION_COLUMNS: &str = "id, task_id, student_id, team_id, github_url, demo_url, \
     drive_link, notes, status, scores, feedback, total_score, applied_at, submitted_at, \
     reviewed_at";

impl Submission {
    /// Applies a student to a task
    ///
    /// Inserts the pending submission and bumps `tasks.applicants` in one
    /// transaction, so the counter and the row count cannot diverge.
    ///
    /// # Errors
    ///
    /// A duplicate application surfaces as a database error carrying the
    /// `submissions_task_student_key` constraint.
    pub async fn apply(
        pool: &PgPool,
        task_id: Uuid,
        student_id: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            INSERT INTO submissions (task_id, student_id, team_id)
            VALUES ($1, $2, $3)
            RETURNING {SUBMISSION_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(student_id)
        .bind(team_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE tasks SET applicants = applicants + 1 WHERE id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(submission)
    }

    /// Finds the submission for a (task, student) pair
    pub async fn find_by_task_and_student(
        pool: &PgPool,
        task_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE task_id = $1 AND student_id = $2"
        ))
        .bind(task_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Finds a submission by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Records submitted work, moving the submission to `submitted`
    ///
    /// The status precondition lives in the WHERE clause: only `pending` or
    /// `submitted` rows match, so a reviewed submission can never be
    /// overwritten. Returns `None` when no row matched (no application, or
    /// already reviewed; callers distinguish the two with a follow-up read).
    pub async fn record_work(
        pool: &PgPool,
        task_id: Uuid,
        student_id: Uuid,
        payload: WorkPayload,
    ) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            UPDATE submissions
            SET github_url = $3,
                demo_url = $4,
                drive_link = $5,
                notes = $6,
                status = 'submitted',
                submitted_at = NOW()
            WHERE task_id = $1 AND student_id = $2 AND status IN ('pending', 'submitted')
            RETURNING {SUBMISSION_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(student_id)
        .bind(payload.github_url)
        .bind(payload.demo_url)
        .bind(payload.drive_link)
        .bind(payload.notes)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Records a mentor evaluation, moving the submission to `reviewed`
    ///
    /// Only a `submitted` row matches; evaluating a pending or already
    /// reviewed submission returns `None`. Ownership of the parent task is
    /// checked by the caller before this runs.
    pub async fn review(
        pool: &PgPool,
        id: Uuid,
        evaluation: Evaluation,
    ) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            UPDATE submissions
            SET scores = $2,
                feedback = $3,
                total_score = $4,
                status = 'reviewed',
                reviewed_at = NOW()
            WHERE id = $1 AND status = 'submitted'
            RETURNING {SUBMISSION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(Json(evaluation.scores))
        .bind(evaluation.feedback)
        .bind(evaluation.total_score)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Lists a student's submissions with task display fields, newest first
    pub async fn list_by_student(
        pool: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<StudentSubmission>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, StudentSubmission>(
            r#"
            SELECT s.id, s.task_id, s.student_id, s.team_id, s.github_url, s.demo_url,
                   s.drive_link, s.notes, s.status, s.scores, s.feedback, s.total_score,
                   s.applied_at, s.submitted_at, s.reviewed_at,
                   t.title AS task_title, t.deadline AS task_deadline
            FROM submissions s
            JOIN tasks t ON t.id = s.task_id
            WHERE s.student_id = $1
            ORDER BY s.applied_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }

    /// Lists submissions against a mentor's tasks, resolved for display
    ///
    /// With `only_submitted` the result is the review queue; otherwise all
    /// statuses are returned.
    pub async fn list_for_mentor(
        pool: &PgPool,
        mentor_id: Uuid,
        only_submitted: bool,
    ) -> Result<Vec<MentorSubmission>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, MentorSubmission>(
            r#"
            SELECT s.id, s.task_id, s.student_id, s.team_id, s.github_url, s.demo_url,
                   s.drive_link, s.notes, s.status, s.scores, s.feedback, s.total_score,
                   s.applied_at, s.submitted_at, s.reviewed_at,
                   u.name AS student_name, u.email AS student_email,
                   t.title AS task_title,
                   tm.name AS team_name
            FROM submissions s
            JOIN tasks t ON t.id = s.task_id
            JOIN users u ON u.id = s.student_id
            LEFT JOIN teams tm ON tm.id = s.team_id
            WHERE t.mentor_id = $1 AND ($2 = FALSE OR s.status = 'submitted')
            ORDER BY s.applied_at DESC
            "#,
        )
        .bind(mentor_id)
        .bind(only_submitted)
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(SubmissionStatus::Pending.as_str(), "pending");
        assert_eq!(SubmissionStatus::Submitted.as_str(), "submitted");
        assert_eq!(SubmissionStatus::Reviewed.as_str(), "reviewed");
    }

    #[test]
    fn test_status_is_monotonic() {
        // Forward transitions
        assert!(SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Submitted));
        assert!(SubmissionStatus::Submitted.can_transition_to(SubmissionStatus::Reviewed));

        // Resubmission before review
        assert!(SubmissionStatus::Submitted.can_transition_to(SubmissionStatus::Submitted));

        // No regression
        assert!(!SubmissionStatus::Submitted.can_transition_to(SubmissionStatus::Pending));
        assert!(!SubmissionStatus::Reviewed.can_transition_to(SubmissionStatus::Submitted));
        assert!(!SubmissionStatus::Reviewed.can_transition_to(SubmissionStatus::Pending));

        // Review requires a prior submission
        assert!(!SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Reviewed));

        // Reviewed is terminal
        assert!(!SubmissionStatus::Reviewed.can_transition_to(SubmissionStatus::Reviewed));
    }

    #[test]
    fn test_status_is_active() {
        assert!(SubmissionStatus::Pending.is_active());
        assert!(SubmissionStatus::Submitted.is_active());
        assert!(!SubmissionStatus::Reviewed.is_active());
    }

    #[test]
    fn test_score_map_keys_are_rubric_indices() {
        let mut scores = ScoreMap::new();
        scores.insert("0".to_string(), 55);
        scores.insert("1".to_string(), 35);

        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"0":55,"1":35}"#);

        let total: i32 = scores.values().sum();
        assert_eq!(total, 90);
    }
}
