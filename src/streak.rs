//! Day-granular training streak
//!
//! State lives on the owner row as `(streak_days, last_workout_date)`.
//! Starts at `(0, None)` and only moves when a workout is logged.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{CoachError, Result};
use crate::models::StreakState;

/// Transition for a log performed on `today`.
///
/// Returns `None` when the owner already trained today (no change).
pub fn next_streak(current: StreakState, today: NaiveDate) -> Option<StreakState> {
  let Some(last) = current.last_workout_date else {
    return Some(StreakState {
      streak_days: 1,
      last_workout_date: Some(today),
    });
  };

  let streak_days = match (today - last).num_days() {
    0 => return None,
    1 => current.streak_days + 1,
    _ => 1,
  };

  Some(StreakState {
    streak_days,
    last_workout_date: Some(today),
  })
}

/// Apply the transition to the owner's stored state and return the result.
pub async fn record_training_day(
  conn: &mut SqliteConnection,
  owner_id: i64,
  today: NaiveDate,
) -> Result<StreakState> {
  let current: Option<StreakState> =
    sqlx::query_as("SELECT streak_days, last_workout_date FROM users WHERE id = ?1")
      .bind(owner_id)
      .fetch_optional(&mut *conn)
      .await?;
  let current = current.ok_or(CoachError::OwnerNotFound(owner_id))?;

  let Some(next) = next_streak(current, today) else {
    return Ok(current);
  };

  sqlx::query("UPDATE users SET streak_days = ?1, last_workout_date = ?2 WHERE id = ?3")
    .bind(next.streak_days)
    .bind(next.last_workout_date)
    .bind(owner_id)
    .execute(&mut *conn)
    .await?;

  debug!(owner_id, streak_days = next.streak_days, "Streak updated");
  Ok(next)
}
