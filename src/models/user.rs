use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Owner of plans and workouts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Owner {
  pub id: i64,
  pub name: String,
  pub streak_days: i64,
  pub last_workout_date: Option<NaiveDate>,
  pub created_at: Option<NaiveDateTime>,
}

impl Owner {
  pub fn streak(&self) -> StreakState {
    StreakState {
      streak_days: self.streak_days,
      last_workout_date: self.last_workout_date,
    }
  }
}

/// Consecutive-training-day counter carried on the owner row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct StreakState {
  pub streak_days: i64,
  pub last_workout_date: Option<NaiveDate>,
}
