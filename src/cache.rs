//! Local cache of the last synced journal.

use crate::models::Entry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheData {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_weight: Option<String>,
}

#[derive(Debug, Default)]
pub struct LocalCache {
    path: Option<PathBuf>,
    data: CacheData,
}

impl LocalCache {
    /// A cache that is never written to disk.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Opens the cache file; a missing or unreadable file starts empty.
    pub async fn open(path: PathBuf) -> Self {
        let data = load_cache(&path).await;
        Self {
            path: Some(path),
            data,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.data.entries
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.data.last_sync
    }

    pub fn last_weight(&self) -> Option<&str> {
        self.data.last_weight.as_deref()
    }

    /// Stores a fresh server listing and stamps the sync time.
    pub async fn record_sync(&mut self, entries: Vec<Entry>) -> std::io::Result<()> {
        self.data.entries = entries;
        self.data.last_sync = Some(Utc::now());
        self.persist().await
    }

    pub async fn set_last_weight(&mut self, weight: impl Into<String>) -> std::io::Result<()> {
        self.data.last_weight = Some(weight.into());
        self.persist().await
    }

    pub async fn clear_entries(&mut self) -> std::io::Result<()> {
        self.data.entries.clear();
        self.persist().await
    }

    async fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(&self.data)?;
        fs::write(path, payload).await
    }
}

async fn load_cache(path: &Path) -> CacheData {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            error!("failed to parse local cache: {err}");
            CacheData::default()
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => CacheData::default(),
        Err(err) => {
            error!("failed to read local cache: {err}");
            CacheData::default()
        }
    }
}
