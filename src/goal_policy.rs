//! Goal-driven set/rep prescription
//!
//! Pure mapping from a training goal to the set and rep ranges a generated
//! plan must respect, plus the rest-time heuristic applied per exercise.

use serde::{Deserialize, Serialize};

use crate::models::TrainingGoal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalParameters {
  pub min_sets: i64,
  pub max_sets: i64,
  pub min_reps: i64,
  pub max_reps: i64,
}

impl GoalParameters {
  /// Ranges for a goal; `None` (no stated goal) gets the general range.
  pub fn for_goal(goal: Option<TrainingGoal>) -> Self {
    let (min_sets, max_sets, min_reps, max_reps) = match goal {
      Some(TrainingGoal::Strength) => (4, 6, 3, 6),
      Some(TrainingGoal::Hypertrophy) => (3, 5, 8, 12),
      Some(TrainingGoal::Endurance) => (2, 4, 15, 25),
      Some(TrainingGoal::WeightLoss) => (3, 4, 12, 20),
      Some(TrainingGoal::GeneralFitness) | None => (3, 5, 8, 15),
    };
    Self {
      min_sets,
      max_sets,
      min_reps,
      max_reps,
    }
  }
}

/// Heavier sets (fewer reps) get longer rest.
pub fn rest_seconds_for_reps(reps: i64) -> i64 {
  if reps <= 6 {
    180
  } else if reps <= 12 {
    90
  } else {
    60
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ranges_are_ordered_for_every_goal() {
    let goals = TrainingGoal::ALL.into_iter().map(Some).chain([None]);
    for goal in goals {
      let p = GoalParameters::for_goal(goal);
      assert!(p.min_sets <= p.max_sets, "{:?}", goal);
      assert!(p.min_reps <= p.max_reps, "{:?}", goal);
      assert!(p.min_sets >= 1 && p.min_reps >= 1, "{:?}", goal);
    }
  }

  #[test]
  fn test_goal_table() {
    assert_eq!(
      GoalParameters::for_goal(Some(TrainingGoal::Strength)),
      GoalParameters { min_sets: 4, max_sets: 6, min_reps: 3, max_reps: 6 }
    );
    assert_eq!(
      GoalParameters::for_goal(Some(TrainingGoal::Hypertrophy)),
      GoalParameters { min_sets: 3, max_sets: 5, min_reps: 8, max_reps: 12 }
    );
    assert_eq!(
      GoalParameters::for_goal(Some(TrainingGoal::Endurance)),
      GoalParameters { min_sets: 2, max_sets: 4, min_reps: 15, max_reps: 25 }
    );
    assert_eq!(
      GoalParameters::for_goal(Some(TrainingGoal::WeightLoss)),
      GoalParameters { min_sets: 3, max_sets: 4, min_reps: 12, max_reps: 20 }
    );
    assert_eq!(
      GoalParameters::for_goal(None),
      GoalParameters { min_sets: 3, max_sets: 5, min_reps: 8, max_reps: 15 }
    );
    assert_eq!(
      GoalParameters::for_goal(Some(TrainingGoal::GeneralFitness)),
      GoalParameters::for_goal(None)
    );
  }

  #[test]
  fn test_rest_time_boundaries() {
    assert_eq!(rest_seconds_for_reps(1), 180);
    assert_eq!(rest_seconds_for_reps(6), 180);
    assert_eq!(rest_seconds_for_reps(7), 90);
    assert_eq!(rest_seconds_for_reps(12), 90);
    assert_eq!(rest_seconds_for_reps(13), 60);
    assert_eq!(rest_seconds_for_reps(25), 60);
  }
}
