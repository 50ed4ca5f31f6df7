use super::{EntryStore, IdClock, StoreError, prepare};
use crate::journal::sort_by_date;
use crate::models::{Entry, User};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use tracing::info;

/// Relational store. Entries are rows keyed by `(user_email, id)` with the
/// full entry kept as JSON in `data`.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
    ids: std::sync::Arc<IdClock>,
}

impl SqlStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        // every connection to an in-memory database is a separate database
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .min_connections(if in_memory { 1 } else { 0 })
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect(url)
            .await?;
        let store = Self::from_pool(pool);
        store.ensure_tables().await?;
        info!("connected to sql store");
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            ids: Default::default(),
        }
    }

    pub async fn ensure_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                picture TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS journal_entries (
                id INTEGER NOT NULL,
                user_email TEXT NOT NULL,
                date TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (user_email, id)
            )",
        )
        .execute(&self.pool)
        .await?;

        let (max_id,): (Option<i64>,) = sqlx::query_as("SELECT MAX(id) FROM journal_entries")
            .fetch_one(&self.pool)
            .await?;
        if let Some(id) = max_id {
            self.ids.observe(id);
        }
        Ok(())
    }
}

fn row_to_entry((id, user_email, date, data): (i64, String, String, String)) -> Result<Entry, StoreError> {
    let mut entry: Entry = serde_json::from_str(&data)?;
    entry.id = id;
    entry.date = date;
    entry.user_email = user_email;
    Ok(entry)
}

#[async_trait]
impl EntryStore for SqlStore {
    fn backend(&self) -> &'static str {
        "db"
    }

    async fn list(&self, email: &str) -> Result<Vec<Entry>, StoreError> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, user_email, date, data FROM journal_entries WHERE user_email = ?",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = rows
            .into_iter()
            .map(row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_date(&mut entries);
        Ok(entries)
    }

    async fn create(&self, email: &str, mut entry: Entry) -> Result<Entry, StoreError> {
        entry.id = 0;
        let mut stored = prepare(vec![entry], email, &self.ids);
        let entry = stored.remove(0);

        sqlx::query("INSERT INTO journal_entries (id, user_email, date, data) VALUES (?, ?, ?, ?)")
            .bind(entry.id)
            .bind(&entry.user_email)
            .bind(&entry.date)
            .bind(serde_json::to_string(&entry)?)
            .execute(&self.pool)
            .await?;
        Ok(entry)
    }

    async fn replace_all(&self, email: &str, entries: Vec<Entry>) -> Result<usize, StoreError> {
        let entries = prepare(entries, email, &self.ids);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM journal_entries WHERE user_email = ?")
            .bind(email)
            .execute(&mut *tx)
            .await?;
        for entry in &entries {
            sqlx::query("INSERT INTO journal_entries (id, user_email, date, data) VALUES (?, ?, ?, ?)")
                .bind(entry.id)
                .bind(&entry.user_email)
                .bind(&entry.date)
                .bind(serde_json::to_string(entry)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(entries.len())
    }

    async fn clear(&self, email: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM journal_entries WHERE user_email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (email, name, picture) VALUES (?, ?, ?)
             ON CONFLICT (email) DO UPDATE SET name = excluded.name, picture = excluded.picture",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.picture)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
