use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{Entry, MeResponse, MessageResponse, Profile, StatsResponse};
use crate::state::AppState;
use crate::stats::build_stats;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Entry>>, AppError> {
    let entries = state.store.list(&claims.email).await?;
    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<Entry>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let Json(entry) = payload?;
    if entry.date.trim().is_empty() {
        return Err(AppError::bad_request("date is required"));
    }

    let stored = state.store.create(&claims.email, entry).await?;
    info!(user = %claims.email, id = stored.id, date = %stored.date, "entry created");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn replace_entries(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    let Some(raw) = payload.get("entries").filter(|value| value.is_array()) else {
        return Err(AppError::bad_request("Entries must be an array"));
    };
    let entries: Vec<Entry> = serde_json::from_value(raw.clone())
        .map_err(|err| AppError::bad_request(format!("invalid entry: {err}")))?;
    if entries.iter().any(|entry| entry.date.trim().is_empty()) {
        return Err(AppError::bad_request("date is required"));
    }

    let count = state.store.replace_all(&claims.email, entries).await?;
    info!(user = %claims.email, count, "entries replaced");
    Ok(Json(MessageResponse::with_count(
        format!("{count} entries saved ({})", state.store.backend()),
        count,
    )))
}

pub async fn clear_entries(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.clear(&claims.email).await?;
    info!(user = %claims.email, "entries cleared");
    Ok(Json(MessageResponse::new(format!(
        "All entries cleared ({})",
        state.store.backend()
    ))))
}

pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<StatsResponse>, AppError> {
    let entries = state.store.list(&claims.email).await?;
    Ok(Json(build_stats(&entries)))
}

pub async fn me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: Profile {
            email: claims.email,
            name: claims.name,
        },
    })
}

/// Tokens are stateless, so logging out is the client discarding its token.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}
