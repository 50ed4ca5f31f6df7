pub mod app;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod display;
pub mod errors;
pub mod form;
pub mod handlers;
pub mod journal;
pub mod models;
pub mod oauth;
pub mod state;
pub mod stats;
pub mod store;

pub use app::router;
pub use client::{ClientError, JournalClient};
pub use config::Config;
pub use state::AppState;
