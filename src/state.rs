use crate::auth::TokenKeys;
use crate::config::Config;
use crate::oauth::GoogleOAuth;
use crate::store::{EntryStore, MemoryStore, SqlStore, StoreError};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
    pub tokens: TokenKeys,
    pub oauth: Option<Arc<GoogleOAuth>>,
    pub frontend_url: String,
}

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>, tokens: TokenKeys, frontend_url: impl Into<String>) -> Self {
        Self {
            store,
            tokens,
            oauth: None,
            frontend_url: frontend_url.into(),
        }
    }

    pub fn with_oauth(mut self, oauth: GoogleOAuth) -> Self {
        self.oauth = Some(Arc::new(oauth));
        self
    }

    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store: Arc<dyn EntryStore> = if config.use_db {
            info!("using sql storage");
            Arc::new(SqlStore::connect(&config.database_url).await?)
        } else if let Some(path) = &config.data_path {
            info!(path = %path.display(), "using in-memory storage with snapshot");
            Arc::new(MemoryStore::with_snapshot(path.clone()).await?)
        } else {
            info!("using in-memory storage");
            Arc::new(MemoryStore::new())
        };

        let state = Self::new(store, TokenKeys::new(&config.jwt_secret), config.frontend_url.clone());
        Ok(match &config.google {
            Some(google) => state.with_oauth(GoogleOAuth::new(google.clone())),
            None => state,
        })
    }
}
