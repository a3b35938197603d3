pub mod exercise;
pub mod plan;
pub mod user;
pub mod workout;

pub use exercise::{Difficulty, ExerciseCategory, ExerciseDefinition, MuscleGroup, NewExercise};
pub use plan::{PlanExercise, PlanStatus, PlanWithExercises, TrainingGoal, Weekday, WorkoutPlan};
pub use user::{Owner, StreakState};
pub use workout::{Workout, WorkoutSet};
