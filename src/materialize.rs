//! Persisting a generated plan
//!
//! Materialization runs in one transaction under the owner's lock: the
//! owner's active plans are completed, the new plan is inserted as active,
//! then one `plan_exercises` row per scheduled exercise. An unknown exercise
//! id aborts the whole thing.

use chrono::{Duration, NaiveDate};
use serde_json::json;
use sqlx::types::Json;
use tracing::{info, warn};

use crate::catalog;
use crate::db::{self, DbPool, OwnerLocks};
use crate::error::{CoachError, Result};
use crate::goal_policy::rest_seconds_for_reps;
use crate::models::{PlanExercise, PlanStatus, PlanWithExercises, TrainingGoal, Weekday, WorkoutPlan};
use crate::plan_request::PlanParams;
use crate::plan_response::{NormalizedPlanResponse, PlannedExercise};

pub const PLAN_DURATION_WEEKS: i64 = 4;

/// More distinct groups than this and the plan is labelled "Full Body"
const FULL_BODY_THRESHOLD: usize = 2;

/// ---------------------------------------------------------------------------
/// Naming
/// ---------------------------------------------------------------------------

/// "Hypertrophy - Chest & Back Plan", "Custom - Full Body Plan"
pub fn plan_name(params: &PlanParams) -> String {
  let goal = params.goal.map(|g| g.label()).unwrap_or("Custom");
  let groups = if params.muscle_groups.len() > FULL_BODY_THRESHOLD {
    "Full Body".to_string()
  } else {
    params
      .muscle_groups
      .iter()
      .map(|g| g.label())
      .collect::<Vec<_>>()
      .join(" & ")
  };
  format!("{} - {} Plan", goal, groups)
}

pub fn plan_description(params: &PlanParams) -> String {
  format!(
    "AI-generated {}-day workout plan focused on {}. Each session is approximately {} minutes.",
    params.training_days.len(),
    params.goal_label(),
    params.session_duration_minutes
  )
}

fn schedule_summary(params: &PlanParams) -> serde_json::Value {
  json!({
    "workout_days": params.training_days,
    "muscle_groups": params.muscle_groups,
    "focus_muscles": params.focus_muscle_groups,
    "session_duration": params.session_duration_minutes,
  })
}

/// ---------------------------------------------------------------------------
/// Materialization
/// ---------------------------------------------------------------------------

struct ScheduledExercise {
  day: Weekday,
  order: i64,
  planned: PlannedExercise,
}

/// Exercises to persist, in week order then array order.
///
/// Rest days produce nothing. So do days the caller did not ask to train;
/// those are dropped with a warning.
fn schedule(params: &PlanParams, response: &NormalizedPlanResponse) -> Vec<ScheduledExercise> {
  let mut scheduled = Vec::new();
  for (day, plan) in response.iter() {
    if plan.is_rest() {
      continue;
    }
    if !params.is_training_day(day) {
      warn!(day = %day, "Dropping exercises generated for a non-training day");
      continue;
    }
    for (index, planned) in plan.exercises().iter().enumerate() {
      scheduled.push(ScheduledExercise {
        day,
        order: index as i64 + 1,
        planned: *planned,
      });
    }
  }
  scheduled
}

/// Replace the owner's active plan with the generated one.
pub async fn materialize_plan(
  pool: &DbPool,
  locks: &OwnerLocks,
  owner_id: i64,
  params: &PlanParams,
  response: &NormalizedPlanResponse,
  start_date: NaiveDate,
) -> Result<PlanWithExercises> {
  let _guard = locks.acquire(owner_id).await;
  let mut tx = db::begin_write(pool).await?;

  let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
    .bind(owner_id)
    .fetch_optional(&mut *tx)
    .await?;
  if owner.is_none() {
    return Err(CoachError::OwnerNotFound(owner_id));
  }

  let scheduled = schedule(params, response);

  let ids: Vec<i64> = scheduled.iter().map(|s| s.planned.exercise_id).collect();
  let known = catalog::existing_ids(&mut *tx, &ids).await?;
  if let Some(missing) = ids.iter().find(|id| !known.contains(id)) {
    return Err(CoachError::ExerciseNotFound(*missing));
  }

  let completed = sqlx::query("UPDATE workout_plans SET status = ?1 WHERE owner_id = ?2 AND status = ?3")
    .bind(PlanStatus::Completed)
    .bind(owner_id)
    .bind(PlanStatus::Active)
    .execute(&mut *tx)
    .await?
    .rows_affected();

  let plan = sqlx::query_as::<_, WorkoutPlan>(
    r#"
    INSERT INTO workout_plans (
      owner_id, name, description, goal, status,
      duration_weeks, start_date, end_date, schedule_summary
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    RETURNING *
    "#,
  )
  .bind(owner_id)
  .bind(plan_name(params))
  .bind(plan_description(params))
  .bind(params.goal.unwrap_or(TrainingGoal::GeneralFitness))
  .bind(PlanStatus::Active)
  .bind(PLAN_DURATION_WEEKS)
  .bind(start_date)
  .bind(start_date + Duration::weeks(PLAN_DURATION_WEEKS))
  .bind(Json(schedule_summary(params)))
  .fetch_one(&mut *tx)
  .await?;

  let mut exercises = Vec::with_capacity(scheduled.len());
  for s in &scheduled {
    let row = sqlx::query_as::<_, PlanExercise>(
      r#"
      INSERT INTO plan_exercises (
        plan_id, exercise_id, day_of_week, "order",
        target_sets, target_reps, rest_seconds
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      RETURNING *
      "#,
    )
    .bind(plan.id)
    .bind(s.planned.exercise_id)
    .bind(s.day)
    .bind(s.order)
    .bind(s.planned.sets)
    .bind(s.planned.reps)
    .bind(rest_seconds_for_reps(s.planned.reps))
    .fetch_one(&mut *tx)
    .await?;
    exercises.push(row);
  }

  tx.commit().await?;

  info!(
    owner_id,
    plan_id = plan.id,
    exercises = exercises.len(),
    previous_completed = completed,
    "Plan materialized"
  );

  Ok(PlanWithExercises { plan, exercises })
}

/// The owner's active plan with exercises in week order, if any.
pub async fn get_active_plan(pool: &DbPool, owner_id: i64) -> Result<Option<PlanWithExercises>> {
  let plan = sqlx::query_as::<_, WorkoutPlan>(
    "SELECT * FROM workout_plans WHERE owner_id = ?1 AND status = ?2 ORDER BY id DESC LIMIT 1",
  )
  .bind(owner_id)
  .bind(PlanStatus::Active)
  .fetch_optional(pool)
  .await?;

  let Some(plan) = plan else {
    return Ok(None);
  };

  let mut exercises =
    sqlx::query_as::<_, PlanExercise>("SELECT * FROM plan_exercises WHERE plan_id = ?1")
      .bind(plan.id)
      .fetch_all(pool)
      .await?;
  exercises.sort_by_key(|e| (e.day_of_week, e.order));

  Ok(Some(PlanWithExercises { plan, exercises }))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
