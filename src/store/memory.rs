use super::{EntryStore, IdClock, StoreError, prepare};
use crate::journal::sort_by_date;
use crate::models::{Entry, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{error, info};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub users: BTreeMap<String, User>,
}

/// In-process store. With a snapshot path every write is flushed to disk as
/// JSON and the file is reloaded on startup.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Snapshot>,
    snapshot_path: Option<PathBuf>,
    ids: IdClock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_snapshot(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = load_snapshot(&path).await;
        info!(path = %path.display(), entries = data.entries.len(), "loaded snapshot");

        let ids = IdClock::default();
        for entry in &data.entries {
            ids.observe(entry.id);
        }

        Ok(Self {
            data: Mutex::new(data),
            snapshot_path: Some(path),
            ids,
        })
    }

    /// Writes `next` to the snapshot file and only then makes it current, so
    /// a failed write leaves the visible state untouched.
    async fn commit(&self, data: &mut Snapshot, next: Snapshot) -> Result<(), StoreError> {
        if let Some(path) = &self.snapshot_path {
            persist_snapshot(path, &next).await?;
        }
        *data = next;
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, email: &str) -> Result<Vec<Entry>, StoreError> {
        let data = self.data.lock().await;
        let mut entries: Vec<Entry> = data
            .entries
            .iter()
            .filter(|entry| entry.user_email == email)
            .cloned()
            .collect();
        sort_by_date(&mut entries);
        Ok(entries)
    }

    async fn create(&self, email: &str, mut entry: Entry) -> Result<Entry, StoreError> {
        entry.id = 0;
        let mut stored = prepare(vec![entry], email, &self.ids);
        let entry = stored.remove(0);

        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.entries.push(entry.clone());
        self.commit(&mut data, next).await?;
        Ok(entry)
    }

    async fn replace_all(&self, email: &str, entries: Vec<Entry>) -> Result<usize, StoreError> {
        let entries = prepare(entries, email, &self.ids);
        let count = entries.len();

        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.entries.retain(|entry| entry.user_email != email);
        next.entries.extend(entries);
        self.commit(&mut data, next).await?;
        Ok(count)
    }

    async fn clear(&self, email: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.entries.retain(|entry| entry.user_email != email);
        self.commit(&mut data, next).await
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.users.insert(user.email.clone(), user.clone());
        self.commit(&mut data, next).await
    }
}

async fn load_snapshot(path: &Path) -> Snapshot {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse snapshot file: {err}");
                Snapshot::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
        Err(err) => {
            error!("failed to read snapshot file: {err}");
            Snapshot::default()
        }
    }
}

async fn persist_snapshot(path: &Path, data: &Snapshot) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, WorkoutSet};

    fn unique_snapshot_path() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("gym_journal_snapshot_{}_{}.json", std::process::id(), nanos));
        path
    }

    fn squat_day(date: &str) -> Entry {
        let mut entry = Entry::new(date);
        entry.exercises.push(Exercise::new(
            "Squat",
            vec![WorkoutSet::new(Some(100.0), Some(5))],
        ));
        entry
    }

    #[tokio::test]
    async fn create_assigns_id_and_owner() {
        let store = MemoryStore::new();
        let mut incoming = squat_day("2024-01-01");
        incoming.user_email = "spoof@example.com".into();

        let stored = store.create("a@example.com", incoming).await.unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.user_email, "a@example.com");
        assert_eq!(store.list("a@example.com").await.unwrap(), vec![stored]);
        assert!(store.list("spoof@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_sorted_by_date() {
        let store = MemoryStore::new();
        store.create("a@example.com", squat_day("2024-03-01")).await.unwrap();
        store.create("a@example.com", squat_day("2024-01-01")).await.unwrap();

        let dates: Vec<_> = store
            .list("a@example.com")
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.date)
            .collect();
        assert_eq!(dates, ["2024-01-01", "2024-03-01"]);
    }

    #[tokio::test]
    async fn clear_leaves_other_users_alone() {
        let store = MemoryStore::new();
        store.create("a@example.com", squat_day("2024-01-01")).await.unwrap();
        store.create("b@example.com", squat_day("2024-01-01")).await.unwrap();

        store.clear("a@example.com").await.unwrap();
        assert!(store.list("a@example.com").await.unwrap().is_empty());
        assert_eq!(store.list("b@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_all_swaps_only_the_users_entries() {
        let store = MemoryStore::new();
        store.create("a@example.com", squat_day("2024-01-01")).await.unwrap();
        store.create("b@example.com", squat_day("2024-01-05")).await.unwrap();

        let count = store
            .replace_all(
                "a@example.com",
                vec![squat_day("2024-02-01"), squat_day("2024-02-02")],
            )
            .await
            .unwrap();
        assert_eq!(count, 2);

        let mine = store.list("a@example.com").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|entry| entry.id > 0 && entry.date.starts_with("2024-02")));
        assert_eq!(store.list("b@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_all_keeps_each_entry_with_a_repeated_id() {
        let store = MemoryStore::new();
        let mut first = squat_day("2024-02-01");
        first.id = 5;
        let mut second = squat_day("2024-02-02");
        second.id = 5;

        let count = store.replace_all("a@example.com", vec![first, second]).await.unwrap();
        let mine = store.list("a@example.com").await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(mine.len(), 2);
        assert_ne!(mine[0].id, mine[1].id);
    }

    #[tokio::test]
    async fn failed_snapshot_write_leaves_state_unchanged() {
        let path = unique_snapshot_path();
        let store = MemoryStore::with_snapshot(path.clone()).await.unwrap();
        let kept = store.create("a@example.com", squat_day("2024-01-01")).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.create("a@example.com", squat_day("2024-01-02")).await.is_err());
        assert!(
            store
                .replace_all("a@example.com", vec![squat_day("2024-03-01")])
                .await
                .is_err()
        );
        assert!(store.clear("a@example.com").await.is_err());
        assert_eq!(store.list("a@example.com").await.unwrap(), vec![kept]);

        let _ = std::fs::remove_dir(path);
    }

    #[tokio::test]
    async fn snapshot_survives_reload() {
        let path = unique_snapshot_path();
        let stored = {
            let store = MemoryStore::with_snapshot(path.clone()).await.unwrap();
            store
                .upsert_user(&User {
                    email: "a@example.com".into(),
                    name: "A".into(),
                    picture: None,
                })
                .await
                .unwrap();
            store.create("a@example.com", squat_day("2024-01-01")).await.unwrap()
        };

        let reloaded = MemoryStore::with_snapshot(path.clone()).await.unwrap();
        assert_eq!(reloaded.list("a@example.com").await.unwrap(), vec![stored.clone()]);
        let next = reloaded.create("a@example.com", squat_day("2024-01-02")).await.unwrap();
        assert!(next.id > stored.id);
        assert!(reloaded.data.lock().await.users.contains_key("a@example.com"));

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_snapshot_starts_empty() {
        let path = unique_snapshot_path();
        std::fs::write(&path, b"not json").unwrap();
        let store = MemoryStore::with_snapshot(path.clone()).await.unwrap();
        assert!(store.list("a@example.com").await.unwrap().is_empty());
        let _ = std::fs::remove_file(path);
    }
}
