//! Persistence of journal entries and users.

mod memory;
mod sql;

pub use memory::{MemoryStore, Snapshot};
pub use sql::SqlStore;

use crate::models::{Entry, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed stored entry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Short backend name used in logs and response messages.
    fn backend(&self) -> &'static str;

    /// The user's entries, ascending by date.
    async fn list(&self, email: &str) -> Result<Vec<Entry>, StoreError>;

    /// Stores a new entry with a fresh id, owned by `email`.
    async fn create(&self, email: &str, entry: Entry) -> Result<Entry, StoreError>;

    /// Replaces every entry of the user in one step. Entries without an id,
    /// or repeating an id already in the batch, get a fresh one. Returns the
    /// number stored.
    async fn replace_all(&self, email: &str, entries: Vec<Entry>) -> Result<usize, StoreError>;

    async fn clear(&self, email: &str) -> Result<(), StoreError>;

    async fn upsert_user(&self, user: &User) -> Result<(), StoreError>;
}

/// Largest id accepted from callers: 9999-12-31T23:59:59.999Z in epoch ms.
pub const MAX_ENTRY_ID: i64 = 253_402_300_799_999;

/// Issues entry ids: epoch milliseconds, bumped to stay strictly increasing.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicI64,
}

impl IdClock {
    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(previous.saturating_add(1));
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => previous = actual,
            }
        }
    }

    /// Records an id issued elsewhere so later ids stay above it.
    /// Ids outside `1..=MAX_ENTRY_ID` are ignored.
    pub fn observe(&self, id: i64) {
        if (1..=MAX_ENTRY_ID).contains(&id) {
            self.last.fetch_max(id, Ordering::SeqCst);
        }
    }
}

/// Stamps ownership and ids onto entries headed for storage. Missing,
/// out-of-range and repeated ids are replaced so every stored id is unique.
fn prepare(entries: Vec<Entry>, email: &str, ids: &IdClock) -> Vec<Entry> {
    for entry in &entries {
        ids.observe(entry.id);
    }
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .map(|mut entry| {
            if !(1..=MAX_ENTRY_ID).contains(&entry.id) || !seen.insert(entry.id) {
                entry.id = ids.next();
                seen.insert(entry.id);
            }
            entry.user_email = email.to_string();
            entry
        })
        .collect()
}
