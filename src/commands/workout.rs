//! Workout logging commands

use chrono::Local;

use crate::db::AppState;
use crate::error::CommandError;
use crate::models::WorkoutSet;
use crate::workout_log::{self, ExerciseLog, LoggedExercise, SetEdit, WorkoutSummary};

const DEFAULT_SUMMARY_DAYS: i64 = 7;

/// Log one exercise to today's (or the given day's) workout
pub async fn log_exercise_performance(
  state: &AppState,
  owner_id: i64,
  entry: ExerciseLog,
) -> Result<LoggedExercise, CommandError> {
  Ok(
    workout_log::log_exercise_performance(
      &state.db,
      &state.locks,
      owner_id,
      &entry,
      state.config.strict_exercise_resolution,
    )
    .await?,
  )
}

pub async fn get_workout_summary(
  state: &AppState,
  owner_id: i64,
  days: Option<i64>,
) -> Result<WorkoutSummary, CommandError> {
  let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS);
  Ok(workout_log::get_workout_summary(&state.db, owner_id, days, Local::now().date_naive()).await?)
}

/// Correct the most recently logged set
pub async fn edit_latest_set(
  state: &AppState,
  owner_id: i64,
  edit: SetEdit,
) -> Result<Option<WorkoutSet>, CommandError> {
  Ok(workout_log::edit_latest_set(&state.db, &state.locks, owner_id, &edit).await?)
}
