//! Exercise catalog lookups
//!
//! Read-only queries used by plan generation (filter by muscle group,
//! existence checks) and by workout logging (name/alias resolution), plus the
//! one write the core performs on the catalog: inserting a placeholder when a
//! logged name matches nothing.

use std::collections::HashSet;

use sqlx::types::Json;
use sqlx::SqliteExecutor;
use tracing::{info, warn};

use crate::db::{self, DbPool};
use crate::models::{Difficulty, ExerciseCategory, ExerciseDefinition, MuscleGroup, NewExercise};

/// Active exercises whose muscle group is one of `groups`, ordered by id.
pub async fn list_available<'e, E>(
  executor: E,
  groups: &[MuscleGroup],
) -> Result<Vec<ExerciseDefinition>, sqlx::Error>
where
  E: SqliteExecutor<'e>,
{
  let groups: Vec<&str> = groups.iter().map(|g| g.as_str()).collect();

  sqlx::query_as::<_, ExerciseDefinition>(
    r#"
    SELECT * FROM exercises
    WHERE is_active = 1
      AND muscle_group IN (SELECT value FROM json_each(?1))
    ORDER BY id
    "#,
  )
  .bind(Json(groups))
  .fetch_all(executor)
  .await
}

/// Resolve free text to a catalog entry.
///
/// Case-insensitive exact match on the canonical name wins over an alias
/// match; ties fall back to the oldest entry.
pub async fn find_by_name_or_alias<'e, E>(
  executor: E,
  input: &str,
) -> Result<Option<ExerciseDefinition>, sqlx::Error>
where
  E: SqliteExecutor<'e>,
{
  let needle = input.trim().to_lowercase();

  sqlx::query_as::<_, ExerciseDefinition>(
    r#"
    SELECT * FROM exercises
    WHERE LOWER(name) = ?1
       OR EXISTS (
         SELECT 1 FROM json_each(exercises.aliases)
         WHERE LOWER(json_each.value) = ?1
       )
    ORDER BY (LOWER(name) = ?1) DESC, id
    LIMIT 1
    "#,
  )
  .bind(&needle)
  .fetch_optional(executor)
  .await
}

/// Which of `ids` exist in the catalog
pub async fn existing_ids<'e, E>(executor: E, ids: &[i64]) -> Result<HashSet<i64>, sqlx::Error>
where
  E: SqliteExecutor<'e>,
{
  let rows: Vec<(i64,)> =
    sqlx::query_as("SELECT id FROM exercises WHERE id IN (SELECT value FROM json_each(?1))")
      .bind(Json(ids))
      .fetch_all(executor)
      .await?;

  Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn insert_exercise<'e, E>(executor: E, new: &NewExercise) -> Result<ExerciseDefinition, sqlx::Error>
where
  E: SqliteExecutor<'e>,
{
  let aliases: Vec<String> = new.aliases.iter().map(|a| a.trim().to_lowercase()).collect();

  sqlx::query_as::<_, ExerciseDefinition>(
    r#"
    INSERT INTO exercises (name, aliases, category, muscle_group, difficulty, description)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    RETURNING *
    "#,
  )
  .bind(new.name.trim())
  .bind(Json(aliases))
  .bind(new.category)
  .bind(new.muscle_group)
  .bind(new.difficulty)
  .bind(&new.description)
  .fetch_one(executor)
  .await
}

/// Create a best-effort entry for a name nothing in the catalog matched.
///
/// The muscle group is `Unknown` unless the caller supplies a hint.
pub async fn create_placeholder<'e, E>(
  executor: E,
  name: &str,
  muscle_group: Option<MuscleGroup>,
) -> Result<ExerciseDefinition, sqlx::Error>
where
  E: SqliteExecutor<'e>,
{
  warn!(name = %name.trim(), "No catalog match, creating placeholder exercise");

  insert_exercise(
    executor,
    &NewExercise {
      name: name.trim().to_string(),
      aliases: Vec::new(),
      category: ExerciseCategory::Strength,
      muscle_group: muscle_group.unwrap_or(MuscleGroup::Unknown),
      difficulty: Difficulty::default(),
      description: None,
    },
  )
  .await
}

/// ---------------------------------------------------------------------------
/// Seeding
/// ---------------------------------------------------------------------------

/// Insert the starter catalog if the table is empty. Returns rows inserted.
pub async fn seed_default_exercises(pool: &DbPool) -> Result<usize, sqlx::Error> {
  let mut tx = db::begin_write(pool).await?;

  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
    .fetch_one(&mut *tx)
    .await?;
  if count > 0 {
    return Ok(0);
  }

  let defaults = default_exercises();
  for exercise in &defaults {
    insert_exercise(&mut *tx, exercise).await?;
  }
  tx.commit().await?;

  info!(count = defaults.len(), "Seeded exercise catalog");
  Ok(defaults.len())
}

fn default_exercises() -> Vec<NewExercise> {
  use Difficulty::*;
  use MuscleGroup::*;

  let rows: [(&str, &[&str], MuscleGroup, Difficulty, &str); 20] = [
    ("Bench Press", &["bench", "bp", "flat bench", "barbell bench"], Chest, Intermediate, "Lie on bench, lower bar to chest, press up"),
    ("Incline Bench Press", &["incline bench", "incline bp", "incline press"], Chest, Intermediate, "Bench press at 30-45 degree angle"),
    ("Dumbbell Chest Press", &["db press", "dumbbell press", "db chest press"], Chest, Beginner, "Press dumbbells from chest level"),
    ("Push-up", &["pushup", "push up", "pressup"], Chest, Beginner, "Bodyweight press from the floor"),
    ("Deadlift", &["dl", "dead lift", "conventional deadlift"], Back, Advanced, "Lift bar from floor to hip height"),
    ("Pull-up", &["pullup", "pull up", "chin up"], Back, Intermediate, "Hang from bar, pull chin over bar"),
    ("Barbell Row", &["bb row", "bent over row", "barbell rows"], Back, Intermediate, "Hinge forward and row bar to torso"),
    ("Lat Pulldown", &["lat pull down", "pulldown", "lat pull"], Back, Beginner, "Pull cable bar down to upper chest"),
    ("Squat", &["back squat", "barbell squat", "squats"], Legs, Intermediate, "Bar on upper back, squat to depth"),
    ("Front Squat", &["front squats"], Legs, Advanced, "Bar on front delts, squat upright"),
    ("Leg Press", &["leg press machine"], Legs, Beginner, "Press sled away on the leg press machine"),
    ("Romanian Deadlift", &["rdl", "stiff leg deadlift", "romanian dl"], Legs, Intermediate, "Hip hinge with soft knees"),
    ("Lunges", &["walking lunges", "lunge"], Legs, Beginner, "Alternate forward lunges"),
    ("Overhead Press", &["ohp", "military press", "shoulder press", "press"], Shoulders, Intermediate, "Press bar overhead from the shoulders"),
    ("Lateral Raise", &["side raise", "dumbbell lateral raise", "lateral raises"], Shoulders, Beginner, "Raise dumbbells out to the sides"),
    ("Face Pull", &["face pulls", "cable face pull"], Shoulders, Beginner, "Pull rope attachment toward face"),
    ("Barbell Curl", &["bb curl", "bicep curl", "barbell curls"], Arms, Beginner, "Curl bar from thighs to shoulders"),
    ("Tricep Dips", &["dips", "tricep dip"], Arms, Intermediate, "Lower and press on parallel bars"),
    ("Plank", &["front plank", "planks"], Core, Beginner, "Hold a straight-body position on forearms"),
    ("Hanging Leg Raise", &["leg raise", "hanging leg raises"], Core, Intermediate, "Raise legs while hanging from a bar"),
  ];

  rows
    .into_iter()
    .map(|(name, aliases, muscle_group, difficulty, description)| NewExercise {
      name: name.to_string(),
      aliases: aliases.iter().map(|a| a.to_string()).collect(),
      category: ExerciseCategory::Strength,
      muscle_group,
      difficulty,
      description: Some(description.to_string()),
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use serial_test::serial;

  #[tokio::test]
  #[serial]
  async fn test_list_available_filters_by_group_and_active() {
    let pool = setup_test_db().await;
    seed_test_exercises(&pool).await;
    sqlx::query("UPDATE exercises SET is_active = 0 WHERE name = 'Push-up'")
      .execute(&pool)
      .await
      .unwrap();

    let chest = list_available(&pool, &[MuscleGroup::Chest]).await.unwrap();
    assert!(!chest.is_empty());
    assert!(chest.iter().all(|e| e.muscle_group == MuscleGroup::Chest));
    assert!(chest.iter().all(|e| e.name != "Push-up"));

    let none = list_available(&pool, &[MuscleGroup::FullBody]).await.unwrap();
    assert!(none.is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_find_by_name_is_case_insensitive() {
    let pool = setup_test_db().await;
    seed_test_exercises(&pool).await;

    let found = find_by_name_or_alias(&pool, "bench PRESS").await.unwrap();
    assert_eq!(found.map(|e| e.name), Some("Bench Press".to_string()));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_find_by_alias() {
    let pool = setup_test_db().await;
    seed_test_exercises(&pool).await;

    let found = find_by_name_or_alias(&pool, "  RDL ").await.unwrap();
    assert_eq!(found.map(|e| e.name), Some("Romanian Deadlift".to_string()));

    let missing = find_by_name_or_alias(&pool, "zercher carry").await.unwrap();
    assert!(missing.is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_create_placeholder_uses_unknown_group() {
    let pool = setup_test_db().await;

    let created = create_placeholder(&pool, " Zercher Carry ", None).await.unwrap();
    assert_eq!(created.name, "Zercher Carry");
    assert_eq!(created.muscle_group, MuscleGroup::Unknown);
    assert_eq!(created.category, ExerciseCategory::Strength);
    assert!(created.aliases.is_empty());

    let hinted = create_placeholder(&pool, "Sled Push", Some(MuscleGroup::Legs)).await.unwrap();
    assert_eq!(hinted.muscle_group, MuscleGroup::Legs);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_existing_ids() {
    let pool = setup_test_db().await;
    let ids = seed_test_exercises(&pool).await;

    let found = existing_ids(&pool, &[ids[0], 9999]).await.unwrap();
    assert!(found.contains(&ids[0]));
    assert!(!found.contains(&9999));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_seed_default_exercises_only_once() {
    let pool = setup_test_db().await;

    let first = seed_default_exercises(&pool).await.unwrap();
    assert_eq!(first, 20);
    let second = seed_default_exercises(&pool).await.unwrap();
    assert_eq!(second, 0);

    let ohp = find_by_name_or_alias(&pool, "ohp").await.unwrap().unwrap();
    assert_eq!(ohp.name, "Overhead Press");
    assert_eq!(ohp.muscle_group, MuscleGroup::Shoulders);

    teardown_test_db(pool).await;
  }
}
