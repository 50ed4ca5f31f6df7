//! HTTP client for the journal API with local-cache fallback.

use crate::cache::LocalCache;
use crate::form::JournalForm;
use crate::journal::{consolidate, merge_entries};
use crate::models::{BulkRequest, Entry, MessageResponse, StatsResponse};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required: {0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("local cache error: {0}")]
    Cache(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Server,
    Cache,
}

#[derive(Debug, Clone)]
pub struct Journal {
    pub entries: Vec<Entry>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Entry),
    Updated(Entry),
}

impl SaveOutcome {
    pub fn entry(&self) -> &Entry {
        match self {
            SaveOutcome::Created(entry) | SaveOutcome::Updated(entry) => entry,
        }
    }
}

pub struct JournalClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    cache: LocalCache,
}

impl JournalClient {
    pub fn new(base_url: impl Into<String>, cache: LocalCache) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            cache,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Loads the journal, falling back to the cache on network failure.
    pub async fn load_journal(&mut self) -> Result<Journal, ClientError> {
        match self.fetch_entries().await {
            Ok(remote) => {
                let entries = merge_entries(self.cache.entries(), &remote);
                if let Err(err) = self.cache.record_sync(remote).await {
                    warn!("failed to update local cache: {err}");
                }
                Ok(Journal {
                    entries,
                    source: Source::Server,
                })
            }
            Err(ClientError::Network(reason)) => {
                warn!("loading from local cache: {reason}");
                Ok(Journal {
                    entries: merge_entries(self.cache.entries(), &[]),
                    source: Source::Cache,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn fetch_entries(&mut self) -> Result<Vec<Entry>, ClientError> {
        self.call(Method::GET, "/api/entries", |request| request).await
    }

    pub async fn fetch_stats(&mut self) -> Result<StatsResponse, ClientError> {
        self.call(Method::GET, "/api/stats", |request| request).await
    }

    /// Submits the form. On success the pending list clears; on any failure
    /// it stays in the form for a retry.
    pub async fn save(&mut self, form: &mut JournalForm) -> Result<SaveOutcome, ClientError> {
        let incoming = form.begin_submit()?;
        let body_weight = incoming.body_weight.clone();

        match self.submit(incoming).await {
            Ok(outcome) => {
                form.complete();
                if let Some(weight) = body_weight {
                    if let Err(err) = self.cache.set_last_weight(weight).await {
                        warn!("failed to remember body weight: {err}");
                    }
                }
                Ok(outcome)
            }
            Err(err) => {
                form.fail();
                Err(err)
            }
        }
    }

    async fn submit(&mut self, incoming: Entry) -> Result<SaveOutcome, ClientError> {
        let mut existing = self.fetch_entries().await?;
        let Some(index) = existing.iter().position(|entry| entry.date == incoming.date) else {
            let created: Entry = self
                .call(Method::POST, "/api/entries", |request| request.json(&incoming))
                .await?;
            return Ok(SaveOutcome::Created(created));
        };

        consolidate(&mut existing[index], incoming);
        let updated = existing[index].clone();
        let body = BulkRequest { entries: existing };
        let _: MessageResponse = self
            .call(Method::POST, "/api/entries/bulk", |request| request.json(&body))
            .await?;
        Ok(SaveOutcome::Updated(updated))
    }

    /// Deletes every entry of the signed-in user, locally and on the server.
    pub async fn clear_all(&mut self) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .call(Method::DELETE, "/api/entries", |request| request)
            .await?;
        self.cache.clear_entries().await?;
        Ok(())
    }

    async fn call<T, F>(&mut self, method: Method, path: &str, build: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let response = match self.send(method, path, build).await {
            Err(ClientError::Auth(reason)) => {
                self.logout();
                return Err(ClientError::Auth(reason));
            }
            other => other?,
        };
        Ok(response.json().await?)
    }

    async fn send<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ClientError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| ClientError::Auth("No authentication token".into()))?;
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "api request");

        let response = build(self.http.request(method, &url).bearer_auth(token))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(body),
            _ => ClientError::Network(format!("API error: {} - {body}", status.as_u16())),
        })
    }
}
