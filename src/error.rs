//! Error types for the coach core.

use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum CoachError {
  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("No active exercises available for the requested muscle groups")]
  NoExercisesAvailable,

  /// No generation service is configured (e.g. missing API key).
  #[error("Plan generation unavailable: {0}")]
  GenerationUnavailable(#[from] LlmError),

  /// The generation service could not be reached on the final attempt.
  #[error("Plan generation failed after {attempts} attempts: {source}")]
  GenerationFailed {
    attempts: u32,
    #[source]
    source: LlmError,
  },

  /// Every attempt produced a response the validator rejected.
  #[error("Plan generation exhausted after {attempts} attempts: {last_error}")]
  GenerationExhausted { attempts: u32, last_error: String },

  #[error("Exercise {0} does not exist in the catalog")]
  ExerciseNotFound(i64),

  #[error("No catalog exercise matches {0:?}")]
  UnknownExercise(String),

  #[error("Owner {0} not found")]
  OwnerNotFound(i64),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

impl CoachError {
  /// Attempts spent before a generation error was raised, if applicable.
  pub fn attempts(&self) -> Option<u32> {
    match self {
      Self::GenerationFailed { attempts, .. } | Self::GenerationExhausted { attempts, .. } => {
        Some(*attempts)
      }
      _ => None,
    }
  }
}

/// Error shape handed to callers that need something serializable
#[derive(Debug, Serialize)]
pub struct CommandError {
  pub kind: &'static str,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub attempts: Option<u32>,
}

impl From<CoachError> for CommandError {
  fn from(e: CoachError) -> Self {
    let kind = match &e {
      CoachError::InvalidInput(_) => "invalid_input",
      CoachError::NoExercisesAvailable => "no_exercises_available",
      CoachError::GenerationUnavailable(_) => "generation_unavailable",
      CoachError::GenerationFailed { .. } => "generation_failed",
      CoachError::GenerationExhausted { .. } => "generation_exhausted",
      CoachError::ExerciseNotFound(_) => "exercise_not_found",
      CoachError::UnknownExercise(_) => "unknown_exercise",
      CoachError::OwnerNotFound(_) => "owner_not_found",
      CoachError::Database(_) => "database",
    };
    Self {
      kind,
      attempts: e.attempts(),
      message: e.to_string(),
    }
  }
}

pub type Result<T, E = CoachError> = std::result::Result<T, E>;
