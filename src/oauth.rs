//! Google sign-in: authorization-code exchange ending in one of our tokens.

use crate::config::GoogleConfig;
use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::store::StoreError;
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid url: {0}")]
    Url(String),

    #[error("provider request failed: {0}")]
    Provider(#[from] reqwest::Error),

    #[error("provider profile has no email")]
    MissingEmail,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] crate::auth::TokenError),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

pub struct GoogleOAuth {
    config: GoogleConfig,
    http: Client,
}

impl GoogleOAuth {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn authorize_url(&self) -> Result<Url, OAuthError> {
        Url::parse_with_params(
            AUTHORIZE_ENDPOINT,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
            ],
        )
        .map_err(|err| OAuthError::Url(err.to_string()))
    }

    /// Trades an authorization code for the signed-in user's profile.
    pub async fn exchange(&self, code: &str) -> Result<User, OAuthError> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: UserInfo = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = info.email.ok_or(OAuthError::MissingEmail)?;
        Ok(User {
            name: info.name.unwrap_or_else(|| email.clone()),
            email,
            picture: info.picture,
        })
    }
}

pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::unavailable("OAuth not configured"))?;
    let url = oauth.authorize_url().map_err(AppError::internal)?;
    Ok(Redirect::to(url.as_str()))
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::unavailable("OAuth not configured"))?;

    if let Some(reason) = params.error {
        return Ok(frontend_redirect(&state.frontend_url, "error", &reason));
    }
    let Some(code) = params.code else {
        return Ok(frontend_redirect(&state.frontend_url, "error", "missing_code"));
    };

    match sign_in(&state, oauth, &code).await {
        Ok((user, token)) => {
            info!(user = %user.email, "signed in");
            Ok(frontend_redirect(&state.frontend_url, "token", &token))
        }
        Err(err) => {
            error!("sign-in failed: {err}");
            Ok(frontend_redirect(&state.frontend_url, "error", "authentication_failed"))
        }
    }
}

async fn sign_in(state: &AppState, oauth: &GoogleOAuth, code: &str) -> Result<(User, String), OAuthError> {
    let user = oauth.exchange(code).await?;
    state.store.upsert_user(&user).await?;
    let token = state.tokens.sign(&user.email, &user.name)?;
    Ok((user, token))
}

/// `{frontend}?{key}={value}`, falling back to plain concatenation when the
/// configured frontend URL does not parse.
pub fn frontend_redirect(frontend_url: &str, key: &str, value: &str) -> Redirect {
    match Url::parse_with_params(frontend_url, &[(key, value)]) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(_) => Redirect::to(&format!("{frontend_url}?{key}={value}")),
    }
}
