use std::path::Path;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::RunQueryDsl;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde::Serialize;

use crate::error::{NudgeError, Result};

mod schema;
use schema::reminders;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
type SqlitePool = Pool<SqliteAsyncConn>;
type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: i32,
    pub task: String,
    pub remind_at: i64,
    pub created_at: i64,
}

#[derive(Queryable)]
struct ReminderRow {
    id: i32,
    task: String,
    remind_at: i64,
    created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = reminders)]
struct NewReminder<'a> {
    task: &'a str,
    remind_at: i64,
    created_at: i64,
}

/// Durable record of reminders. Records are created once, never updated,
/// never deleted; the only reads are full listings.
pub struct ReminderStore {
    pool: SqlitePool,
}

impl ReminderStore {
    pub async fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        ensure_parent_dir(sqlite_path)?;
        run_migrations(sqlite_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
        let pool: SqlitePool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| NudgeError::Storage(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Persists a new reminder. The future-time check sits in front of the
    /// insert because the store is the durability boundary: nothing with a
    /// non-future `remind_at` may ever reach disk.
    pub async fn insert(&self, task: &str, remind_at: i64, now: i64) -> Result<Reminder> {
        if remind_at <= now {
            return Err(NudgeError::PastOrInvalidTime);
        }

        let mut conn = self.conn().await?;
        let new = NewReminder {
            task,
            remind_at,
            created_at: now,
        };

        diesel::insert_into(reminders::table)
            .values(&new)
            .execute(&mut conn)
            .await
            .map_err(|e| NudgeError::Storage(e.to_string()))?;

        let row: ReminderRow = reminders::table
            .order(reminders::id.desc())
            .first(&mut conn)
            .await
            .map_err(|e| NudgeError::Storage(e.to_string()))?;
        Ok(map_row(row))
    }

    pub async fn list(&self) -> Result<Vec<Reminder>> {
        let mut conn = self.conn().await?;
        let rows: Vec<ReminderRow> = reminders::table
            .order(reminders::remind_at.asc())
            .load(&mut conn)
            .await
            .map_err(|e| NudgeError::Storage(e.to_string()))?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        self.pool
            .get()
            .await
            .map_err(|e| NudgeError::Storage(e.to_string()))
    }
}

fn map_row(row: ReminderRow) -> Reminder {
    Reminder {
        id: row.id,
        task: row.task,
        remind_at: row.remind_at,
        created_at: row.created_at,
    }
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| NudgeError::Storage(e.to_string()))?;
    }
    Ok(())
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_url)
            .map_err(|e| NudgeError::Storage(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| NudgeError::Storage(e.to_string()))?;
        Ok::<_, NudgeError>(())
    })
    .await
    .map_err(|e| NudgeError::Runtime(e.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ReminderStore;
    use crate::error::NudgeError;

    #[tokio::test]
    async fn insert_assigns_ids_and_list_returns_all() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("reminders.db");
        let db_path = db_path.to_string_lossy().to_string();
        let store = ReminderStore::new(&db_path).await.expect("store");

        let now = 1_771_147_543_i64;
        let first = store
            .insert("Feed the cats", now + 60, now)
            .await
            .expect("first insert");
        let second = store
            .insert("Water the plants", now + 120, now)
            .await
            .expect("second insert");

        assert_ne!(first.id, second.id);
        assert_eq!(first.created_at, now);
        assert_eq!(first.remind_at, now + 60);

        let items = store.list().await.expect("list reminders");
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|r| r.task == "Feed the cats"));
        assert!(items.iter().any(|r| r.task == "Water the plants"));
    }

    #[tokio::test]
    async fn insert_rejects_past_or_present_times_before_persisting() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("reminders.db");
        let db_path = db_path.to_string_lossy().to_string();
        let store = ReminderStore::new(&db_path).await.expect("store");

        let now = 1_771_147_543_i64;
        let at_now = store.insert("Too late", now, now).await;
        assert!(matches!(at_now, Err(NudgeError::PastOrInvalidTime)));

        let in_past = store.insert("Way too late", now - 5, now).await;
        assert!(matches!(in_past, Err(NudgeError::PastOrInvalidTime)));

        let items = store.list().await.expect("list reminders");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn store_reopens_existing_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("reminders.db");
        let db_path = db_path.to_string_lossy().to_string();

        let now = 1_771_147_543_i64;
        {
            let store = ReminderStore::new(&db_path).await.expect("store");
            store
                .insert("Survives reopen", now + 600, now)
                .await
                .expect("insert");
        }

        let reopened = ReminderStore::new(&db_path).await.expect("reopened store");
        let items = reopened.list().await.expect("list reminders");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task, "Survives reopen");
    }
}
