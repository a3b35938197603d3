use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use crate::config::AppConfig;

pub type DbPool = SqlitePool;

/// How long a writer waits on another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared by every command
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
  pub locks: OwnerLocks,
}

impl AppState {
  pub fn new(db: DbPool, config: AppConfig) -> Self {
    Self {
      db,
      config,
      locks: OwnerLocks::default(),
    }
  }
}

/// Per-owner write locks.
///
/// Logging and plan materialization hold the owner's lock for the whole
/// transaction so set numbering, streak updates and the active-plan
/// transition never interleave for the same owner. Entries are dropped
/// once the last holder or waiter for an owner lets go.
#[derive(Default)]
pub struct OwnerLocks {
  inner: DashMap<i64, Arc<Mutex<()>>>,
}

impl OwnerLocks {
  pub async fn acquire(&self, owner_id: i64) -> OwnerGuard<'_> {
    let lock = self
      .inner
      .entry(owner_id)
      .or_insert_with(|| Arc::new(Mutex::new(())))
      .clone();
    OwnerGuard {
      locks: self,
      owner_id,
      guard: Some(lock.lock_owned().await),
    }
  }
}

/// Held owner lock; releases and prunes the registry entry on drop
pub struct OwnerGuard<'a> {
  locks: &'a OwnerLocks,
  owner_id: i64,
  guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
  fn drop(&mut self) {
    self.guard.take();
    // The map's own reference is the only one left when nobody is waiting
    self
      .locks
      .inner
      .remove_if(&self.owner_id, |_, lock| Arc::strong_count(lock) == 1);
  }
}

/// Begin a transaction that takes SQLite's write lock up front.
///
/// A deferred transaction that reads first cannot be upgraded while another
/// connection is writing and fails with SQLITE_BUSY instead of waiting.
/// `BEGIN IMMEDIATE` waits on the busy timeout.
pub async fn begin_write(pool: &DbPool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
  pool.begin_with("BEGIN IMMEDIATE").await
}

/// Open the connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
  info!(url = %database_url, "Initializing database");

  let options = SqliteConnectOptions::from_str(database_url)?
    .create_if_missing(true)
    .foreign_keys(true)
    .journal_mode(SqliteJournalMode::Wal)
    .busy_timeout(BUSY_TIMEOUT);

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect_with(options)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_owner_lock_serializes_same_owner() {
    let locks = Arc::new(OwnerLocks::default());
    let guard = locks.acquire(1).await;

    let contender = {
      let locks = locks.clone();
      tokio::spawn(async move {
        let _g = locks.acquire(1).await;
      })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!contender.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_secs(1), contender)
      .await
      .expect("contender should acquire after release")
      .unwrap();
  }

  #[tokio::test]
  async fn test_owner_lock_independent_owners() {
    let locks = OwnerLocks::default();
    let _a = locks.acquire(1).await;
    let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
    assert!(b.is_ok());
  }

  #[tokio::test]
  async fn test_owner_lock_entries_are_pruned() {
    let locks = Arc::new(OwnerLocks::default());
    let guard = locks.acquire(1).await;
    assert_eq!(locks.inner.len(), 1);

    let waiter = {
      let locks = locks.clone();
      tokio::spawn(async move {
        let _g = locks.acquire(1).await;
      })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The waiter still needs the same mutex
    drop(guard);
    waiter.await.unwrap();
    assert_eq!(locks.inner.len(), 0);

    let _a = locks.acquire(2).await;
    let _b = locks.acquire(3).await;
    assert_eq!(locks.inner.len(), 2);
  }

  #[tokio::test]
  async fn test_initialize_db_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("coach.db").display());
    let pool = initialize_db(&url).await.unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode").fetch_one(&pool).await.unwrap();
    assert_eq!(mode, "wal");

    let mut tx = begin_write(&pool).await.unwrap();
    sqlx::query("INSERT INTO users (name) VALUES ('Ada')")
      .execute(&mut *tx)
      .await
      .unwrap();
    tx.commit().await.unwrap();

    pool.close().await;
  }
}
