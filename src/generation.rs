//! Plan generation with a bounded attempt budget
//!
//! One request per attempt, each bounded by a timeout. Transport failures
//! and rejected payloads draw from the same budget. The first payload the
//! validator accepts is normalized and returned; the raw document never
//! leaves this module.

use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::GenerationSettings;
use crate::error::{CoachError, Result};
use crate::llm::{LlmError, PlanCompletion};
use crate::plan_request::PlanRequest;
use crate::plan_response::{normalize, validate, NormalizedPlanResponse, RawPlanResponse};

pub struct GenerationClient<'a> {
  completion: &'a dyn PlanCompletion,
  settings: GenerationSettings,
}

impl<'a> GenerationClient<'a> {
  pub fn new(completion: &'a dyn PlanCompletion, settings: GenerationSettings) -> Self {
    Self { completion, settings }
  }

  pub async fn generate(&self, request: &PlanRequest) -> Result<NormalizedPlanResponse> {
    let prompt = request.to_prompt();
    let max_attempts = self.settings.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
      let outcome = match timeout(self.settings.attempt_timeout, self.completion.complete(&prompt)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(LlmError::Timeout(self.settings.attempt_timeout.as_secs())),
      };

      let payload = match outcome {
        Ok(payload) => payload,
        Err(e) => {
          error!(attempt, max_attempts, error = %e, "Plan generation request failed");
          if attempt == max_attempts {
            return Err(CoachError::GenerationFailed {
              attempts: attempt,
              source: e,
            });
          }
          last_error = e.to_string();
          continue;
        }
      };

      let raw = match RawPlanResponse::parse(&payload) {
        Ok(raw) => raw,
        Err(reason) => {
          warn!(attempt, max_attempts, %reason, "Discarding unparseable plan");
          last_error = reason;
          continue;
        }
      };

      if !validate(&raw, &request.params.training_days) {
        warn!(attempt, max_attempts, "Plan has no exercises on any requested training day");
        last_error = "no requested training day contained exercises".to_string();
        continue;
      }

      info!(attempt, "Plan accepted");
      return Ok(normalize(&raw));
    }

    Err(CoachError::GenerationExhausted {
      attempts: max_attempts,
      last_error,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::goal_policy::GoalParameters;
  use crate::models::{Difficulty, MuscleGroup, TrainingGoal, Weekday};
  use crate::plan_request::{AvailableExercise, PlanParams};
  use crate::plan_response::DayPlan;
  use crate::test_utils::*;
  use async_trait::async_trait;
  use std::time::Duration;

  fn request() -> PlanRequest {
    let params = PlanParams::new(
      vec![Weekday::Monday, Weekday::Thursday],
      vec![MuscleGroup::Chest],
      vec![],
      45,
      Some(TrainingGoal::Strength),
    )
    .unwrap();
    PlanRequest {
      parameters: GoalParameters::for_goal(params.goal),
      params,
      available_exercises: vec![AvailableExercise {
        id: 1,
        name: "Bench Press".into(),
        muscle_group: MuscleGroup::Chest,
        difficulty: Difficulty::Intermediate,
      }],
    }
  }

  fn settings(max_attempts: u32) -> GenerationSettings {
    GenerationSettings {
      max_attempts,
      attempt_timeout: Duration::from_secs(5),
    }
  }

  const EMPTY_PLAN: &str = r#"{"monday": "Rest day", "thursday": {"mainFocus": "Chest", "exercises": []}}"#;

  #[tokio::test]
  async fn test_first_valid_reply_is_normalized() {
    let fake = ScriptedCompletion::new(vec![Ok(valid_plan_json(&[Weekday::Monday], 1, 5))]);
    let client = GenerationClient::new(&fake, settings(3));

    let plan = client.generate(&request()).await.unwrap();

    assert_eq!(fake.calls(), 1);
    assert_eq!(plan.keys().len(), 7);
    assert!(!plan.day(Weekday::Monday).is_rest());
    assert!(plan.day(Weekday::Thursday).is_rest());
  }

  #[tokio::test]
  async fn test_rejected_reply_is_retried() {
    let fake = ScriptedCompletion::new(vec![
      Ok(EMPTY_PLAN.to_string()),
      Ok("not json at all".to_string()),
      Ok(valid_plan_json(&[Weekday::Thursday], 1, 4)),
    ]);
    let client = GenerationClient::new(&fake, settings(3));

    let plan = client.generate(&request()).await.unwrap();

    assert_eq!(fake.calls(), 3);
    assert!(matches!(plan.day(Weekday::Thursday), DayPlan::Workout { .. }));
  }

  #[tokio::test]
  async fn test_transport_failure_shares_budget() {
    let fake = ScriptedCompletion::new(vec![
      Err(LlmError::Request("connection reset".into())),
      Ok(valid_plan_json(&[Weekday::Monday], 1, 5)),
    ]);
    let client = GenerationClient::new(&fake, settings(3));

    assert!(client.generate(&request()).await.is_ok());
    assert_eq!(fake.calls(), 2);
  }

  #[tokio::test]
  async fn test_exhausted_after_budget_of_rejections() {
    let fake = ScriptedCompletion::new(vec![
      Ok(EMPTY_PLAN.to_string()),
      Ok(EMPTY_PLAN.to_string()),
      Ok(EMPTY_PLAN.to_string()),
      Ok(valid_plan_json(&[Weekday::Monday], 1, 5)),
    ]);
    let client = GenerationClient::new(&fake, settings(3));

    let err = client.generate(&request()).await.unwrap_err();

    assert_eq!(fake.calls(), 3);
    assert_eq!(err.attempts(), Some(3));
    assert!(matches!(err, CoachError::GenerationExhausted { ref last_error, .. } if last_error.contains("training day")));
  }

  #[tokio::test]
  async fn test_transport_failure_on_final_attempt() {
    let fake = ScriptedCompletion::new(vec![
      Ok(EMPTY_PLAN.to_string()),
      Err(LlmError::Api("overloaded".into())),
    ]);
    let client = GenerationClient::new(&fake, settings(2));

    let err = client.generate(&request()).await.unwrap_err();

    assert!(matches!(
      err,
      CoachError::GenerationFailed { attempts: 2, source: LlmError::Api(_) }
    ));
  }

  struct StalledCompletion;

  #[async_trait]
  impl PlanCompletion for StalledCompletion {
    async fn complete(&self, _prompt: &crate::llm::PlanPrompt) -> std::result::Result<String, LlmError> {
      tokio::time::sleep(Duration::from_secs(60)).await;
      Ok(String::new())
    }
  }

  #[tokio::test]
  async fn test_timeout_counts_as_transport_failure() {
    let client = GenerationClient::new(
      &StalledCompletion,
      GenerationSettings {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(20),
      },
    );

    let err = client.generate(&request()).await.unwrap_err();

    assert!(matches!(
      err,
      CoachError::GenerationFailed { attempts: 2, source: LlmError::Timeout(_) }
    ));
  }
}
