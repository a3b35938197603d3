//! Workout coach core: generated training plans and strength workout logging.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod goal_policy;
pub mod llm;
pub mod materialize;
pub mod models;
pub mod plan_request;
pub mod plan_response;
pub mod streak;
pub mod workout_log;

#[cfg(test)]
pub mod test_utils;

pub use db::AppState;
pub use error::{CoachError, CommandError};
