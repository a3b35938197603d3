use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Muscle group an exercise primarily targets.
///
/// `Unknown` is only ever assigned to placeholder definitions created when a
/// logged exercise name matches nothing in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
  Chest,
  Legs,
  Back,
  Shoulders,
  Arms,
  Core,
  FullBody,
  Unknown,
}

impl MuscleGroup {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Chest => "chest",
      Self::Legs => "legs",
      Self::Back => "back",
      Self::Shoulders => "shoulders",
      Self::Arms => "arms",
      Self::Core => "core",
      Self::FullBody => "full_body",
      Self::Unknown => "unknown",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Chest => "Chest",
      Self::Legs => "Legs",
      Self::Back => "Back",
      Self::Shoulders => "Shoulders",
      Self::Arms => "Arms",
      Self::Core => "Core",
      Self::FullBody => "Full Body",
      Self::Unknown => "Unknown",
    }
  }
}

impl std::str::FromStr for MuscleGroup {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
      "chest" => Ok(Self::Chest),
      "legs" => Ok(Self::Legs),
      "back" => Ok(Self::Back),
      "shoulders" => Ok(Self::Shoulders),
      "arms" => Ok(Self::Arms),
      "core" => Ok(Self::Core),
      "full_body" => Ok(Self::FullBody),
      "unknown" => Ok(Self::Unknown),
      other => Err(format!("Unknown muscle group: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
  Strength,
  Cardio,
  Flexibility,
  Sports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

/// A catalog entry. Aliases are stored lower-cased so alias lookups can
/// compare against the lower-cased user input directly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExerciseDefinition {
  pub id: i64,
  pub name: String,
  pub aliases: Json<Vec<String>>,
  pub category: ExerciseCategory,
  pub muscle_group: MuscleGroup,
  pub difficulty: Difficulty,
  pub description: Option<String>,
  pub is_active: bool,
  pub created_at: Option<NaiveDateTime>,
}

/// For inserting new catalog entries (without id, created_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExercise {
  pub name: String,
  pub aliases: Vec<String>,
  pub category: ExerciseCategory,
  pub muscle_group: MuscleGroup,
  pub difficulty: Difficulty,
  pub description: Option<String>,
}
