pub mod plan;
pub mod workout;

use crate::catalog;
use crate::db::AppState;
use crate::error::{CoachError, CommandError};
use crate::models::Owner;

pub async fn create_owner(state: &AppState, name: String) -> Result<Owner, CommandError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(CoachError::InvalidInput("owner name is required".into()).into());
  }

  sqlx::query_as::<_, Owner>("INSERT INTO users (name) VALUES (?1) RETURNING *")
    .bind(name)
    .fetch_one(&state.db)
    .await
    .map_err(|e| CoachError::from(e).into())
}

pub async fn get_owner(state: &AppState, owner_id: i64) -> Result<Owner, CommandError> {
  sqlx::query_as::<_, Owner>("SELECT * FROM users WHERE id = ?1")
    .bind(owner_id)
    .fetch_optional(&state.db)
    .await
    .map_err(CoachError::from)?
    .ok_or_else(|| CoachError::OwnerNotFound(owner_id).into())
}

/// Load the starter exercise catalog into an empty database
pub async fn seed_catalog(state: &AppState) -> Result<usize, CommandError> {
  catalog::seed_default_exercises(&state.db)
    .await
    .map_err(|e| CoachError::from(e).into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use serial_test::serial;

  #[tokio::test]
  #[serial]
  async fn test_owner_roundtrip() {
    let state = test_state(setup_test_db().await);

    let created = create_owner(&state, " Ada ".into()).await.unwrap();
    assert_eq!(created.name, "Ada");
    assert_eq!(created.streak_days, 0);
    assert!(created.last_workout_date.is_none());

    let fetched = get_owner(&state, created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);

    let missing = get_owner(&state, 404).await.unwrap_err();
    assert_eq!(missing.kind, "owner_not_found");

    let blank = create_owner(&state, "  ".into()).await.unwrap_err();
    assert_eq!(blank.kind, "invalid_input");

    teardown_test_db(state.db).await;
  }
}
