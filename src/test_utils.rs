//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Owner and catalog fixtures
//! - A scripted generation service

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;

use crate::catalog;
use crate::config::AppConfig;
use crate::db::AppState;
use crate::llm::{LlmError, PlanCompletion, PlanPrompt};
use crate::models::{Owner, StreakState, Weekday};
use crate::plan_response::REST_MARKER;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// File-backed database opened the way production opens it, with a real
/// multi-connection pool. Keep the `TempDir` alive for the pool's lifetime.
pub async fn setup_file_test_db() -> (tempfile::TempDir, SqlitePool) {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let url = format!("sqlite://{}", dir.path().join("coach.db").display());
  let pool = crate::db::initialize_db(&url)
    .await
    .expect("Failed to open file database");
  (dir, pool)
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over a test pool with default configuration
pub fn test_state(pool: SqlitePool) -> AppState {
  AppState::new(pool, AppConfig::default())
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

/// Seed the starter catalog
/// Returns exercise IDs in insertion order (chest first)
pub async fn seed_test_exercises(pool: &SqlitePool) -> Vec<i64> {
  catalog::seed_default_exercises(pool)
    .await
    .expect("Failed to seed exercises");

  sqlx::query_scalar("SELECT id FROM exercises ORDER BY id")
    .fetch_all(pool)
    .await
    .expect("Failed to read exercise ids")
}

/// Create an owner with a fresh streak, returning its id
pub async fn seed_test_owner(pool: &SqlitePool, name: &str) -> i64 {
  sqlx::query_scalar("INSERT INTO users (name) VALUES (?1) RETURNING id")
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("Failed to insert owner")
}

pub async fn get_test_owner(pool: &SqlitePool, id: i64) -> Owner {
  sqlx::query_as::<_, Owner>("SELECT * FROM users WHERE id = ?1")
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("Owner not found")
}

pub async fn set_test_streak(pool: &SqlitePool, id: i64, streak: StreakState) {
  sqlx::query("UPDATE users SET streak_days = ?1, last_workout_date = ?2 WHERE id = ?3")
    .bind(streak.streak_days)
    .bind(streak.last_workout_date)
    .bind(id)
    .execute(pool)
    .await
    .expect("Failed to set streak");
}

/// ---------------------------------------------------------------------------
/// Generation Fixtures
/// ---------------------------------------------------------------------------

/// A plan reply with one exercise (3 sets) on each of `days` and rest
/// everywhere else
pub fn valid_plan_json(days: &[Weekday], exercise_id: i64, reps: i64) -> String {
  let map: Map<String, Value> = Weekday::ALL
    .into_iter()
    .map(|day| {
      let value = if days.contains(&day) {
        json!({
          "mainFocus": "Strength",
          "exercises": [{ "exerciseId": exercise_id, "sets": 3, "reps": reps }]
        })
      } else {
        Value::String(REST_MARKER.to_string())
      };
      (day.as_str().to_string(), value)
    })
    .collect();
  Value::Object(map).to_string()
}

/// Generation service that replays canned replies in order
pub struct ScriptedCompletion {
  replies: Mutex<VecDeque<Result<String, LlmError>>>,
  calls: AtomicU32,
  prompts: Mutex<Vec<PlanPrompt>>,
}

impl ScriptedCompletion {
  pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
    Self {
      replies: Mutex::new(replies.into()),
      calls: AtomicU32::new(0),
      prompts: Mutex::new(Vec::new()),
    }
  }

  pub fn calls(&self) -> u32 {
    self.calls.load(Ordering::SeqCst)
  }

  /// Prompts received so far
  pub fn prompts(&self) -> Vec<PlanPrompt> {
    self.prompts.lock().unwrap().clone()
  }
}

#[async_trait]
impl PlanCompletion for ScriptedCompletion {
  async fn complete(&self, prompt: &PlanPrompt) -> Result<String, LlmError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.prompts.lock().unwrap().push(prompt.clone());
    self
      .replies
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(LlmError::Request("no scripted reply left".into())))
  }
}
