use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://gym_journal.db?mode=rwc";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:3000/auth/google/callback";
const FALLBACK_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub use_db: bool,
    pub database_url: String,
    pub data_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub google: Option<GoogleConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using an insecure development secret");
            FALLBACK_JWT_SECRET.to_string()
        });

        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                callback_url: var("GOOGLE_CALLBACK_URL")
                    .unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string()),
            }),
            _ => {
                info!("Google OAuth credentials not provided, OAuth routes disabled");
                None
            }
        };

        Self {
            port: load_or("PORT", DEFAULT_PORT),
            use_db: var("USE_DB").map(|value| parse_flag(&value)).unwrap_or(false),
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            data_path: var("APP_DATA_PATH").map(PathBuf::from),
            jwt_secret,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            google,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_or<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            warn!("invalid {key} value {raw:?}: {err}, using default {default}");
            default
        }),
        None => default,
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
