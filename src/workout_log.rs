//! Workout logging
//!
//! Appends one exercise's sets to the owner's workout for a day, keeping the
//! workout totals, personal-record flags and the owner's streak in step. Each
//! call is one transaction under the owner's lock.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::catalog;
use crate::db::{self, DbPool, OwnerLocks};
use crate::error::{CoachError, Result};
use crate::models::{ExerciseDefinition, MuscleGroup, StreakState, Workout, WorkoutSet};
use crate::streak;

/// Upper bound on `sets` in a single log call
pub const MAX_SETS_PER_LOG: i64 = 50;

/// ---------------------------------------------------------------------------
/// Input / Output
/// ---------------------------------------------------------------------------

/// One logged exercise: `sets` identical sets sharing the same performance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseLog {
  pub exercise_name: String,
  /// Used only when the name matches nothing and a new entry is created
  pub muscle_group: Option<MuscleGroup>,
  /// Defaults to 1
  pub sets: Option<i64>,
  pub reps: Option<i64>,
  pub weight: Option<f64>,
  pub duration_seconds: Option<i64>,
  pub distance: Option<f64>,
  pub perceived_exertion: Option<i64>,
  pub notes: Option<String>,
  #[serde(default)]
  pub is_warmup: bool,
  /// Defaults to today
  pub date: Option<NaiveDate>,
  pub workout_type: Option<String>,
  /// Only applied when the day's workout is created by this call
  pub start_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedExercise {
  pub workout: Workout,
  pub exercise: ExerciseDefinition,
  pub sets: Vec<WorkoutSet>,
  pub personal_record: bool,
  pub streak: StreakState,
}

/// ---------------------------------------------------------------------------
/// Logging
/// ---------------------------------------------------------------------------

pub async fn log_exercise_performance(
  pool: &DbPool,
  locks: &OwnerLocks,
  owner_id: i64,
  entry: &ExerciseLog,
  strict: bool,
) -> Result<LoggedExercise> {
  log_exercise_performance_at(pool, locks, owner_id, entry, strict, Local::now().naive_local()).await
}

/// Same as [`log_exercise_performance`] with an explicit clock.
pub async fn log_exercise_performance_at(
  pool: &DbPool,
  locks: &OwnerLocks,
  owner_id: i64,
  entry: &ExerciseLog,
  strict: bool,
  now: NaiveDateTime,
) -> Result<LoggedExercise> {
  let name = entry.exercise_name.trim();
  if name.is_empty() {
    return Err(CoachError::InvalidInput("exercise name is required".into()));
  }
  let set_count = entry.sets.unwrap_or(1);
  if !(1..=MAX_SETS_PER_LOG).contains(&set_count) {
    return Err(CoachError::InvalidInput(format!(
      "sets must be between 1 and {}, got {}",
      MAX_SETS_PER_LOG, set_count
    )));
  }

  let now_time = now.time().with_nanosecond(0).unwrap_or(now.time());

  let _guard = locks.acquire(owner_id).await;
  let mut tx = db::begin_write(pool).await?;

  let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
    .bind(owner_id)
    .fetch_optional(&mut *tx)
    .await?;
  if owner.is_none() {
    return Err(CoachError::OwnerNotFound(owner_id));
  }

  // Find or create the day's workout
  let workout_date = entry.date.unwrap_or(now.date());
  sqlx::query(
    r#"
    INSERT INTO workouts (owner_id, workout_date, start_time, workout_type)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (owner_id, workout_date) DO NOTHING
    "#,
  )
  .bind(owner_id)
  .bind(workout_date)
  .bind(entry.start_time.unwrap_or(now_time))
  .bind(&entry.workout_type)
  .execute(&mut *tx)
  .await?;

  let workout_id: i64 = sqlx::query_scalar("SELECT id FROM workouts WHERE owner_id = ?1 AND workout_date = ?2")
    .bind(owner_id)
    .bind(workout_date)
    .fetch_one(&mut *tx)
    .await?;

  let exercise = match catalog::find_by_name_or_alias(&mut *tx, name).await? {
    Some(found) => found,
    None if strict => return Err(CoachError::UnknownExercise(name.to_string())),
    None => catalog::create_placeholder(&mut *tx, name, entry.muscle_group).await?,
  };

  let next_set: i64 = sqlx::query_scalar(
    "SELECT COALESCE(MAX(set_number), 0) + 1 FROM workout_sets WHERE workout_id = ?1 AND exercise_id = ?2",
  )
  .bind(workout_id)
  .bind(exercise.id)
  .fetch_one(&mut *tx)
  .await?;

  let mut sets = Vec::with_capacity(set_count as usize);
  for set_number in next_set..next_set + set_count {
    let set = sqlx::query_as::<_, WorkoutSet>(
      r#"
      INSERT INTO workout_sets (
        workout_id, exercise_id, set_number, reps, weight,
        duration_seconds, distance, perceived_exertion, notes, is_warmup
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
      RETURNING *
      "#,
    )
    .bind(workout_id)
    .bind(exercise.id)
    .bind(set_number)
    .bind(entry.reps)
    .bind(entry.weight)
    .bind(entry.duration_seconds)
    .bind(entry.distance)
    .bind(entry.perceived_exertion)
    .bind(&entry.notes)
    .bind(entry.is_warmup)
    .fetch_one(&mut *tx)
    .await?;
    sets.push(set);
  }

  refresh_totals(&mut tx, workout_id).await?;
  refresh_timing(&mut tx, workout_id, now_time).await?;

  let personal_record = match (entry.weight, entry.reps) {
    (Some(weight), Some(reps)) => flag_personal_record(&mut tx, owner_id, exercise.id, weight, reps, &mut sets).await?,
    _ => false,
  };

  let streak = streak::record_training_day(&mut tx, owner_id, now.date()).await?;

  let workout = sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = ?1")
    .bind(workout_id)
    .fetch_one(&mut *tx)
    .await?;

  tx.commit().await?;

  info!(
    owner_id,
    workout_id,
    exercise_id = exercise.id,
    sets = sets.len(),
    personal_record,
    streak_days = streak.streak_days,
    "Exercise logged"
  );

  Ok(LoggedExercise {
    workout,
    exercise,
    sets,
    personal_record,
    streak,
  })
}

/// Recompute total volume and set count from the workout's sets.
async fn refresh_totals(conn: &mut SqliteConnection, workout_id: i64) -> Result<()> {
  sqlx::query(
    r#"
    UPDATE workouts SET
      total_volume = (
        SELECT COALESCE(SUM(COALESCE(reps, 0) * COALESCE(weight, 0)), 0)
        FROM workout_sets WHERE workout_id = ?1
      ),
      total_sets = (SELECT COUNT(*) FROM workout_sets WHERE workout_id = ?1)
    WHERE id = ?1
    "#,
  )
  .bind(workout_id)
  .execute(&mut *conn)
  .await?;
  Ok(())
}

/// Stamp `end_time` and derive the duration from the start time.
async fn refresh_timing(conn: &mut SqliteConnection, workout_id: i64, end_time: NaiveTime) -> Result<()> {
  let start_time: Option<NaiveTime> = sqlx::query_scalar("SELECT start_time FROM workouts WHERE id = ?1")
    .bind(workout_id)
    .fetch_one(&mut *conn)
    .await?;

  let duration_minutes = start_time.map(|start| (end_time - start).num_minutes().abs());

  sqlx::query("UPDATE workouts SET end_time = ?1, duration_minutes = COALESCE(?2, duration_minutes) WHERE id = ?3")
    .bind(end_time)
    .bind(duration_minutes)
    .bind(workout_id)
    .execute(&mut *conn)
    .await?;
  Ok(())
}

/// Flag the newest set as a personal record unless an earlier set by the
/// same owner on the same exercise dominates it (weight >= and reps >=).
async fn flag_personal_record(
  conn: &mut SqliteConnection,
  owner_id: i64,
  exercise_id: i64,
  weight: f64,
  reps: i64,
  inserted: &mut [WorkoutSet],
) -> Result<bool> {
  let new_ids: Vec<i64> = inserted.iter().map(|s| s.id).collect();

  let dominated: bool = sqlx::query_scalar(
    r#"
    SELECT EXISTS (
      SELECT 1 FROM workout_sets s
      JOIN workouts w ON w.id = s.workout_id
      WHERE w.owner_id = ?1
        AND s.exercise_id = ?2
        AND s.weight >= ?3
        AND s.reps >= ?4
        AND s.id NOT IN (SELECT value FROM json_each(?5))
    )
    "#,
  )
  .bind(owner_id)
  .bind(exercise_id)
  .bind(weight)
  .bind(reps)
  .bind(Json(&new_ids))
  .fetch_one(&mut *conn)
  .await?;

  if dominated {
    return Ok(false);
  }

  let Some(latest) = inserted.last_mut() else {
    return Ok(false);
  };
  sqlx::query("UPDATE workout_sets SET is_personal_record = 1 WHERE id = ?1")
    .bind(latest.id)
    .execute(&mut *conn)
    .await?;
  latest.is_personal_record = true;

  debug!(owner_id, exercise_id, weight, reps, "Personal record");
  Ok(true)
}

/// ---------------------------------------------------------------------------
/// Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
  pub total_workouts: i64,
  pub total_volume: f64,
  pub total_sets: i64,
  /// Rounded mean over workouts with a known duration
  pub average_duration_minutes: Option<i64>,
  pub workout_days: Vec<NaiveDate>,
  /// Distinct exercise names, in first-performed order
  pub exercises_performed: Vec<String>,
}

/// Totals over workouts dated within the last `days` days of `today`.
pub async fn get_workout_summary(pool: &DbPool, owner_id: i64, days: i64, today: NaiveDate) -> Result<WorkoutSummary> {
  let since = Duration::try_days(days.max(0))
    .and_then(|window| today.checked_sub_signed(window))
    .ok_or_else(|| CoachError::InvalidInput(format!("summary window of {} days is out of range", days)))?;

  let workouts = sqlx::query_as::<_, Workout>(
    "SELECT * FROM workouts WHERE owner_id = ?1 AND workout_date >= ?2 ORDER BY workout_date",
  )
  .bind(owner_id)
  .bind(since)
  .fetch_all(pool)
  .await?;

  let exercises_performed: Vec<String> = sqlx::query_scalar(
    r#"
    SELECT e.name FROM workout_sets s
    JOIN workouts w ON w.id = s.workout_id
    JOIN exercises e ON e.id = s.exercise_id
    WHERE w.owner_id = ?1 AND w.workout_date >= ?2
    GROUP BY e.id
    ORDER BY MIN(s.id)
    "#,
  )
  .bind(owner_id)
  .bind(since)
  .fetch_all(pool)
  .await?;

  let durations: Vec<i64> = workouts.iter().filter_map(|w| w.duration_minutes).collect();
  let average_duration_minutes = if durations.is_empty() {
    None
  } else {
    Some((durations.iter().sum::<i64>() as f64 / durations.len() as f64).round() as i64)
  };

  Ok(WorkoutSummary {
    total_workouts: workouts.len() as i64,
    total_volume: workouts.iter().map(|w| w.total_volume).sum(),
    total_sets: workouts.iter().map(|w| w.total_sets).sum(),
    average_duration_minutes,
    workout_days: workouts.iter().map(|w| w.workout_date).collect(),
    exercises_performed,
  })
}

/// ---------------------------------------------------------------------------
/// Editing
/// ---------------------------------------------------------------------------

/// Fields to overwrite on a set; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetEdit {
  pub reps: Option<i64>,
  pub weight: Option<f64>,
  pub duration_seconds: Option<i64>,
  pub distance: Option<f64>,
  pub perceived_exertion: Option<i64>,
  pub notes: Option<String>,
}

/// Patch the owner's most recently logged set and refresh its workout's
/// totals. `None` if the owner has never logged a set.
pub async fn edit_latest_set(
  pool: &DbPool,
  locks: &OwnerLocks,
  owner_id: i64,
  edit: &SetEdit,
) -> Result<Option<WorkoutSet>> {
  let _guard = locks.acquire(owner_id).await;
  let mut tx = db::begin_write(pool).await?;

  let latest: Option<i64> = sqlx::query_scalar(
    r#"
    SELECT s.id FROM workout_sets s
    JOIN workouts w ON w.id = s.workout_id
    WHERE w.owner_id = ?1
    ORDER BY s.created_at DESC, s.id DESC
    LIMIT 1
    "#,
  )
  .bind(owner_id)
  .fetch_optional(&mut *tx)
  .await?;

  let Some(set_id) = latest else {
    return Ok(None);
  };

  let set = sqlx::query_as::<_, WorkoutSet>(
    r#"
    UPDATE workout_sets SET
      reps = COALESCE(?1, reps),
      weight = COALESCE(?2, weight),
      duration_seconds = COALESCE(?3, duration_seconds),
      distance = COALESCE(?4, distance),
      perceived_exertion = COALESCE(?5, perceived_exertion),
      notes = COALESCE(?6, notes)
    WHERE id = ?7
    RETURNING *
    "#,
  )
  .bind(edit.reps)
  .bind(edit.weight)
  .bind(edit.duration_seconds)
  .bind(edit.distance)
  .bind(edit.perceived_exertion)
  .bind(&edit.notes)
  .bind(set_id)
  .fetch_one(&mut *tx)
  .await?;

  refresh_totals(&mut tx, set.workout_id).await?;
  tx.commit().await?;

  info!(owner_id, set_id, "Edited latest set");
  Ok(Some(set))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
