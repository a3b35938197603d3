use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One training session per owner per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workout {
  pub id: i64,
  pub owner_id: i64,
  pub workout_date: NaiveDate,
  pub start_time: Option<NaiveTime>,
  pub end_time: Option<NaiveTime>,
  pub duration_minutes: Option<i64>,
  pub workout_type: Option<String>,
  /// Sum of reps x weight over all sets
  pub total_volume: f64,
  pub total_sets: i64,
  pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutSet {
  pub id: i64,
  pub workout_id: i64,
  pub exercise_id: i64,
  pub set_number: i64,
  pub reps: Option<i64>,
  pub weight: Option<f64>,
  pub duration_seconds: Option<i64>,
  pub distance: Option<f64>,
  pub perceived_exertion: Option<i64>,
  pub notes: Option<String>,
  pub is_warmup: bool,
  pub is_personal_record: bool,
  pub created_at: Option<NaiveDateTime>,
}
