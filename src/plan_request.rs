//! Plan request construction
//!
//! Turns the caller's preferences into everything the generation service is
//! handed: the available exercises, the goal's set/rep ranges, a JSON schema
//! the reply must conform to, and the system/user instructions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::SqliteExecutor;

use crate::catalog;
use crate::error::{CoachError, Result};
use crate::goal_policy::GoalParameters;
use crate::llm::PlanPrompt;
use crate::models::{Difficulty, MuscleGroup, TrainingGoal, Weekday};
use crate::plan_response::REST_MARKER;

pub const MIN_SESSION_MINUTES: i64 = 15;
pub const MAX_SESSION_MINUTES: i64 = 180;
const SCHEMA_NAME: &str = "weekly_workout_plan";

/// ---------------------------------------------------------------------------
/// Request Parameters
/// ---------------------------------------------------------------------------

/// Validated caller preferences for one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanParams {
  /// Distinct training days in week order
  pub training_days: Vec<Weekday>,
  pub muscle_groups: Vec<MuscleGroup>,
  pub focus_muscle_groups: Vec<MuscleGroup>,
  pub session_duration_minutes: i64,
  pub goal: Option<TrainingGoal>,
}

impl PlanParams {
  pub fn new(
    training_days: Vec<Weekday>,
    muscle_groups: Vec<MuscleGroup>,
    focus_muscle_groups: Vec<MuscleGroup>,
    session_duration_minutes: i64,
    goal: Option<TrainingGoal>,
  ) -> Result<Self> {
    let mut training_days = training_days;
    training_days.sort();
    training_days.dedup();
    if training_days.is_empty() {
      return Err(CoachError::InvalidInput("at least one training day is required".into()));
    }

    let muscle_groups = dedup_in_order(muscle_groups);
    if muscle_groups.is_empty() {
      return Err(CoachError::InvalidInput("at least one muscle group is required".into()));
    }

    let focus_muscle_groups = match dedup_in_order(focus_muscle_groups) {
      focus if focus.is_empty() => muscle_groups.clone(),
      focus => focus,
    };

    if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&session_duration_minutes) {
      return Err(CoachError::InvalidInput(format!(
        "session duration must be between {} and {} minutes, got {}",
        MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, session_duration_minutes
      )));
    }

    Ok(Self {
      training_days,
      muscle_groups,
      focus_muscle_groups,
      session_duration_minutes,
      goal,
    })
  }

  pub fn is_training_day(&self, day: Weekday) -> bool {
    self.training_days.contains(&day)
  }

  /// Label used in instructions and descriptions
  pub fn goal_label(&self) -> &'static str {
    match self.goal {
      Some(goal) => goal.label(),
      None => "general fitness",
    }
  }
}

fn dedup_in_order(groups: Vec<MuscleGroup>) -> Vec<MuscleGroup> {
  let mut out: Vec<MuscleGroup> = Vec::with_capacity(groups.len());
  for g in groups {
    if !out.contains(&g) {
      out.push(g);
    }
  }
  out
}

/// ---------------------------------------------------------------------------
/// Plan Request
/// ---------------------------------------------------------------------------

/// Catalog projection handed to the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableExercise {
  pub id: i64,
  pub name: String,
  pub muscle_group: MuscleGroup,
  pub difficulty: Difficulty,
}

#[derive(Debug, Clone)]
pub struct PlanRequest {
  pub params: PlanParams,
  pub parameters: GoalParameters,
  pub available_exercises: Vec<AvailableExercise>,
}

/// Query the catalog and assemble the request.
///
/// Fails with [`CoachError::NoExercisesAvailable`] when no active exercise
/// targets any of the requested muscle groups.
pub async fn build_plan_request<'e, E>(executor: E, params: PlanParams) -> Result<PlanRequest>
where
  E: SqliteExecutor<'e>,
{
  let available_exercises: Vec<AvailableExercise> = catalog::list_available(executor, &params.muscle_groups)
    .await?
    .into_iter()
    .map(|e| AvailableExercise {
      id: e.id,
      name: e.name,
      muscle_group: e.muscle_group,
      difficulty: e.difficulty,
    })
    .collect();

  if available_exercises.is_empty() {
    return Err(CoachError::NoExercisesAvailable);
  }

  Ok(PlanRequest {
    parameters: GoalParameters::for_goal(params.goal),
    params,
    available_exercises,
  })
}

impl PlanRequest {
  /// JSON schema the generated reply must satisfy.
  ///
  /// Every weekday key is required; each value is either the rest marker or
  /// a workout object. No additional properties are allowed at any level.
  pub fn output_schema(&self) -> Value {
    let p = &self.parameters;

    let exercise = json!({
      "type": "object",
      "properties": {
        "exerciseId": { "type": "integer" },
        "sets": { "type": "integer", "minimum": p.min_sets, "maximum": p.max_sets },
        "reps": { "type": "integer", "minimum": p.min_reps, "maximum": p.max_reps }
      },
      "required": ["exerciseId", "sets", "reps"],
      "additionalProperties": false
    });

    let day = json!({
      "anyOf": [
        { "type": "string", "enum": [REST_MARKER] },
        {
          "type": "object",
          "properties": {
            "mainFocus": { "type": "string" },
            "exercises": { "type": "array", "minItems": 1, "items": exercise }
          },
          "required": ["mainFocus", "exercises"],
          "additionalProperties": false
        }
      ]
    });

    let properties: Map<String, Value> = Weekday::ALL
      .iter()
      .map(|d| (d.as_str().to_string(), day.clone()))
      .collect();
    let required: Vec<&str> = Weekday::ALL.iter().map(|d| d.as_str()).collect();

    json!({
      "type": "object",
      "properties": properties,
      "required": required,
      "additionalProperties": false
    })
  }

  pub fn system_prompt(&self) -> String {
    let p = &self.parameters;
    let exercises_json = serde_json::to_string(&self.available_exercises).unwrap_or_else(|_| "[]".into());
    let days: Vec<&str> = Weekday::ALL.iter().map(|d| d.as_str()).collect();

    format!(
      r#"You are a strength coach writing a one-week training template.

Use ONLY these exercises (refer to them by id): {exercises}

Reply with a single JSON object whose keys are exactly: {days}.
Every day must be present.
- A day without training is the string "{rest}".
- A training day is an object with "mainFocus" (string) and "exercises" (non-empty array).
- Each exercise is an object with "exerciseId" (integer id from the list), "sets" (integer {min_sets}-{max_sets}) and "reps" (integer {min_reps}-{max_reps}).

Programming rules:
1. Compound lifts first, isolation work last.
2. Balance opposing muscle groups.
3. Do not load the same muscle group on consecutive days.
4. Scale the number of exercises to the session length."#,
      exercises = exercises_json,
      days = serde_json::to_string(&days).unwrap_or_default(),
      rest = REST_MARKER,
      min_sets = p.min_sets,
      max_sets = p.max_sets,
      min_reps = p.min_reps,
      max_reps = p.max_reps,
    )
  }

  pub fn user_prompt(&self) -> String {
    let join_days = |days: &[Weekday]| days.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ");
    let join_groups = |groups: &[MuscleGroup]| groups.iter().map(|g| g.as_str()).collect::<Vec<_>>().join(", ");
    let training_days = join_days(&self.params.training_days[..]);

    format!(
      r#"Build a weekly plan with:
- Training days: {training_days} (rest on every other day)
- Target muscle groups: {groups}
- Primary focus: {focus}
- Session duration: {duration} minutes
- Goal: {goal}

Only {training_days} may contain exercises. Every other day must be "{rest}"."#,
      training_days = training_days,
      groups = join_groups(&self.params.muscle_groups[..]),
      focus = join_groups(&self.params.focus_muscle_groups[..]),
      duration = self.params.session_duration_minutes,
      goal = self.params.goal_label(),
      rest = REST_MARKER,
    )
  }

  pub fn to_prompt(&self) -> PlanPrompt {
    PlanPrompt {
      system: self.system_prompt(),
      user: self.user_prompt(),
      schema_name: SCHEMA_NAME.to_string(),
      schema: self.output_schema(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
