/// Team model and database operations
///
/// Teams are created by students and joined via a shareable 6-character
/// invite code. The `members` array is append-only while a member stays, so
/// array order is join order; the leader is always an element of it.
///
/// # Invariants
///
/// - `code` is unique across all teams (`teams_code_key`), enforced by the
///   store; creation draws codes optimistically and regenerates on a
///   constraint violation, with a bounded number of attempts.
/// - `members` is non-empty while the row exists; when the last member
///   leaves, the row is deleted.
/// - `leader_id ∈ members`; when the leader leaves, leadership passes to the
///   earliest-joined remaining member.
///
/// Membership mutations never read-modify-write the array from application
/// code: joins are a single conditional UPDATE, and departures lock the row
/// (`SELECT ... FOR UPDATE`) so concurrent leaves serialize instead of both
/// electing a leader from a stale member list.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Alphabet for invite codes: 36^6 ≈ 2.2e9 possible codes
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Invite code length
pub const CODE_LEN: usize = 6;

/// Collision retries before giving up on code generation
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Error type for team operations
#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    /// Code generation kept colliding (practically unreachable)
    #[error("Could not generate a unique team code after {MAX_CODE_ATTEMPTS} attempts")]
    CodeSpaceExhausted,

    /// Underlying database error
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Team model representing a student team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// Unique 6-character invite code
    pub code: String,

    /// Current leader (always a member)
    pub leader_id: Uuid,

    /// Member IDs in join order, leader included
    pub members: Vec<Uuid>,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

/// Team with members resolved to display fields (read-side join)
#[derive(Debug, Clone, Serialize)]
pub struct TeamDetail {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub leader: UserSummary,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a member leaving a team
#[derive(Debug, Clone, Serialize)]
pub struct LeaveOutcome {
    /// The team after the departure, absent when it was disbanded
    pub team: Option<Team>,

    /// Whether the departure deleted the team
    pub deleted: bool,
}

/// What a departure does to the membership, computed from a locked row
#[derive(Debug, Clone, PartialEq, Eq)]
enum Departure {
    /// Team continues with this membership and leader
    Remaining { members: Vec<Uuid>, leader_id: Uuid },

    /// The last member left; the row is deleted
    Disbanded,
}

/// Applies the leader-succession rule to a member list
///
/// Removal keeps join order, so when the leader departs the new leader is
/// the earliest-joined remaining member. A departure by someone who is not
/// in the list leaves the membership untouched.
fn plan_departure(members: &[Uuid], leader_id: Uuid, leaving: Uuid) -> Departure {
    let remaining: Vec<Uuid> = members.iter().copied().filter(|m| *m != leaving).collect();

    if remaining.is_empty() {
        return Departure::Disbanded;
    }

    let leader_id = if leaving == leader_id {
        remaining[0]
    } else {
        leader_id
    };

    Departure::Remaining {
        members: remaining,
        leader_id,
    }
}

/// Draws a random invite code from `[A-Z0-9]{6}`
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

const TEAM_COLUMNS: &str = "id, name, code, leader_id, members, created_at";

impl Team {
    /// Creates a team with the caller as sole member and leader
    ///
    /// The invite code is drawn at random; the unique index on `code` is the
    /// source of truth for uniqueness, so a collision on insert triggers a
    /// regeneration and retry. After [`MAX_CODE_ATTEMPTS`] collisions the
    /// operation fails with [`TeamError::CodeSpaceExhausted`].
    pub async fn create(pool: &PgPool, name: &str, leader_id: Uuid) -> Result<Self, TeamError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();

            let result = sqlx::query_as::<_, Team>(&format!(
                r#"
                INSERT INTO teams (name, code, leader_id, members)
                VALUES ($1, $2, $3, ARRAY[$3])
                RETURNING {TEAM_COLUMNS}
                "#,
            ))
            .bind(name)
            .bind(&code)
            .bind(leader_id)
            .fetch_one(pool)
            .await;

            match result {
                Ok(team) => return Ok(team),
                Err(sqlx::Error::Database(db_err))
                    if db_err.constraint() == Some("teams_code_key") =>
                {
                    tracing::debug!(code = %code, "Team code collision, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TeamError::CodeSpaceExhausted)
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// Finds a team by invite code
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// Appends a member, rejecting duplicates in the same statement
    ///
    /// Returns `None` when no row matched: either the code is unknown or the
    /// caller is already a member. The duplicate check sits in the WHERE
    /// clause, not in a prior read, so two concurrent joins cannot both pass
    /// it against a stale member list.
    pub async fn join(pool: &PgPool, code: &str, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE teams
            SET members = array_append(members, $2)
            WHERE code = $1 AND NOT ($2 = ANY(members))
            RETURNING {TEAM_COLUMNS}
            "#,
        ))
        .bind(code)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// Removes a member, transferring leadership or disbanding as needed
    ///
    /// The row is locked for the duration of the transaction so concurrent
    /// departures from the same team serialize. Returns `Ok(None)` when the
    /// team does not exist.
    pub async fn leave(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LeaveOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(team) = team else {
            return Ok(None);
        };

        let outcome = match plan_departure(&team.members, team.leader_id, user_id) {
            Departure::Disbanded => {
                sqlx::query("DELETE FROM teams WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                LeaveOutcome {
                    team: None,
                    deleted: true,
                }
            }
            Departure::Remaining { members, leader_id } => {
                let team = sqlx::query_as::<_, Team>(&format!(
                    r#"
                    UPDATE teams
                    SET members = $2, leader_id = $3
                    WHERE id = $1
                    RETURNING {TEAM_COLUMNS}
                    "#,
                ))
                .bind(id)
                .bind(&members)
                .bind(leader_id)
                .fetch_one(&mut *tx)
                .await?;

                LeaveOutcome {
                    team: Some(team),
                    deleted: false,
                }
            }
        };

        tx.commit().await?;

        Ok(Some(outcome))
    }

    /// Resolves members and leader to display fields
    ///
    /// Pure read; the returned member list preserves join order.
    pub async fn detail(&self, pool: &PgPool) -> Result<TeamDetail, sqlx::Error> {
        let summaries = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email FROM users WHERE id = ANY($1)",
        )
        .bind(&self.members)
        .fetch_all(pool)
        .await?;

        // ANY() does not preserve array order; re-order by the members list
        let mut members = Vec::with_capacity(self.members.len());
        for member_id in &self.members {
            if let Some(summary) = summaries.iter().find(|s| s.id == *member_id) {
                members.push(summary.clone());
            }
        }

        let leader = members
            .iter()
            .find(|m| m.id == self.leader_id)
            .cloned()
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(TeamDetail {
            id: self.id,
            name: self.name.clone(),
            code: self.code.clone(),
            leader,
            members,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_leader_departure_promotes_earliest_member() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let plan = plan_departure(&[a, b, c], a, a);
        assert_eq!(
            plan,
            Departure::Remaining {
                members: vec![b, c],
                leader_id: b,
            }
        );
    }

    #[test]
    fn test_non_leader_departure_keeps_leader() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let plan = plan_departure(&[a, b, c], a, b);
        assert_eq!(
            plan,
            Departure::Remaining {
                members: vec![a, c],
                leader_id: a,
            }
        );
    }

    #[test]
    fn test_last_member_departure_disbands() {
        let a = Uuid::new_v4();
        assert_eq!(plan_departure(&[a], a, a), Departure::Disbanded);
    }

    #[test]
    fn test_departure_of_non_member_is_noop() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let plan = plan_departure(&[a, b], a, stranger);
        assert_eq!(
            plan,
            Departure::Remaining {
                members: vec![a, b],
                leader_id: a,
            }
        );
    }

    #[test]
    fn test_successive_departures_follow_join_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        // A (leader) leaves -> B leads [B, C]
        let plan = plan_departure(&[a, b, c], a, a);
        let Departure::Remaining { members, leader_id } = plan else {
            panic!("expected remaining members");
        };
        assert_eq!(leader_id, b);

        // B leaves -> C leads [C]
        let plan = plan_departure(&members, leader_id, b);
        assert_eq!(
            plan,
            Departure::Remaining {
                members: vec![c],
                leader_id: c,
            }
        );

        // C leaves -> disbanded
        let plan = plan_departure(&[c], c, c);
        assert_eq!(plan, Departure::Disbanded);
    }
}
