//! Plan generation commands

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::AppState;
use crate::error::{CoachError, CommandError};
use crate::generation::GenerationClient;
use crate::llm::{OpenAiClient, PlanCompletion};
use crate::materialize;
use crate::models::{MuscleGroup, PlanWithExercises, TrainingGoal, Weekday};
use crate::plan_request::{build_plan_request, PlanParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlanInput {
  pub training_days: Vec<Weekday>,
  pub muscle_groups: Vec<MuscleGroup>,
  /// Defaults to `muscle_groups` when empty
  #[serde(default)]
  pub focus_muscle_groups: Vec<MuscleGroup>,
  pub session_duration_minutes: i64,
  pub goal: Option<TrainingGoal>,
}

/// Generate a plan with the configured service and make it the owner's
/// active plan
pub async fn generate_plan(
  state: &AppState,
  owner_id: i64,
  input: GeneratePlanInput,
) -> Result<PlanWithExercises, CommandError> {
  let client = OpenAiClient::from_config(&state.config).map_err(CoachError::from)?;
  generate_plan_with(state, &client, owner_id, input).await
}

/// Same as [`generate_plan`] against any generation service
pub async fn generate_plan_with(
  state: &AppState,
  completion: &dyn PlanCompletion,
  owner_id: i64,
  input: GeneratePlanInput,
) -> Result<PlanWithExercises, CommandError> {
  let params = PlanParams::new(
    input.training_days,
    input.muscle_groups,
    input.focus_muscle_groups,
    input.session_duration_minutes,
    input.goal,
  )?;

  let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
    .bind(owner_id)
    .fetch_optional(&state.db)
    .await
    .map_err(CoachError::from)?;
  if owner.is_none() {
    return Err(CoachError::OwnerNotFound(owner_id).into());
  }

  let request = build_plan_request(&state.db, params).await?;
  info!(
    owner_id,
    available = request.available_exercises.len(),
    days = request.params.training_days.len(),
    "Generating plan"
  );

  let response = GenerationClient::new(completion, state.config.generation)
    .generate(&request)
    .await?;

  let plan = materialize::materialize_plan(
    &state.db,
    &state.locks,
    owner_id,
    &request.params,
    &response,
    Local::now().date_naive(),
  )
  .await?;

  Ok(plan)
}

pub async fn get_active_plan(state: &AppState, owner_id: i64) -> Result<Option<PlanWithExercises>, CommandError> {
  Ok(materialize::get_active_plan(&state.db, owner_id).await?)
}
