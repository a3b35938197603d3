use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// ---------------------------------------------------------------------------
/// Training Goal
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingGoal {
  Strength,
  Hypertrophy,
  Endurance,
  WeightLoss,
  GeneralFitness,
}

impl TrainingGoal {
  pub const ALL: [TrainingGoal; 5] = [
    TrainingGoal::Strength,
    TrainingGoal::Hypertrophy,
    TrainingGoal::Endurance,
    TrainingGoal::WeightLoss,
    TrainingGoal::GeneralFitness,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      Self::Strength => "Strength",
      Self::Hypertrophy => "Hypertrophy",
      Self::Endurance => "Endurance",
      Self::WeightLoss => "Weight Loss",
      Self::GeneralFitness => "General Fitness",
    }
  }
}

impl std::str::FromStr for TrainingGoal {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
      "strength" => Ok(Self::Strength),
      "hypertrophy" => Ok(Self::Hypertrophy),
      "endurance" => Ok(Self::Endurance),
      "weight_loss" => Ok(Self::WeightLoss),
      "general_fitness" => Ok(Self::GeneralFitness),
      other => Err(format!("Unknown training goal: {}", other)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Plan Status
/// ---------------------------------------------------------------------------

/// Lifecycle of a plan. At most one plan per owner is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
  Active,
  Completed,
  Paused,
  Archived,
}


/// ---------------------------------------------------------------------------
/// Weekday
/// ---------------------------------------------------------------------------

/// Canonical weekday. Ordering follows the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl Weekday {
  pub const ALL: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Monday => "monday",
      Self::Tuesday => "tuesday",
      Self::Wednesday => "wednesday",
      Self::Thursday => "thursday",
      Self::Friday => "friday",
      Self::Saturday => "saturday",
      Self::Sunday => "sunday",
    }
  }

  /// "monday" -> "Monday"
  pub fn capitalized(&self) -> String {
    let s = self.as_str();
    let mut chars = s.chars();
    match chars.next() {
      Some(first) => first.to_uppercase().chain(chars).collect(),
      None => String::new(),
    }
  }
}

impl std::fmt::Display for Weekday {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Weekday {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_lowercase();
    Weekday::ALL
      .into_iter()
      .find(|d| d.as_str() == lower)
      .ok_or_else(|| format!("Unknown weekday: {}", s))
  }
}

/// ---------------------------------------------------------------------------
/// Persisted Plan Rows
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutPlan {
  pub id: i64,
  pub owner_id: i64,
  pub name: String,
  pub description: Option<String>,
  pub goal: TrainingGoal,
  pub status: PlanStatus,
  pub duration_weeks: Option<i64>,
  pub start_date: NaiveDate,
  pub end_date: Option<NaiveDate>,
  pub schedule_summary: Option<Json<serde_json::Value>>,
  pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanExercise {
  pub id: i64,
  pub plan_id: i64,
  pub exercise_id: i64,
  pub day_of_week: Weekday,
  pub order: i64,
  pub target_sets: i64,
  pub target_reps: i64,
  pub rest_seconds: i64,
}

/// A plan together with its exercises, ordered by weekday then position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWithExercises {
  pub plan: WorkoutPlan,
  pub exercises: Vec<PlanExercise>,
}

impl PlanWithExercises {
  /// Exercises scheduled for a single day, in plan order.
  pub fn exercises_for(&self, day: Weekday) -> Vec<&PlanExercise> {
    self.exercises.iter().filter(|e| e.day_of_week == day).collect()
  }
}
