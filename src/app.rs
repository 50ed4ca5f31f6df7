use crate::state::AppState;
use crate::{handlers, oauth};
use axum::{
    Router,
    extract::Request,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.frontend_url);

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/google", get(oauth::google_login))
        .route("/auth/google/callback", get(oauth::google_callback))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", get(handlers::logout))
        .route(
            "/api/entries",
            get(handlers::list_entries)
                .post(handlers::create_entry)
                .delete(handlers::clear_entries),
        )
        .route("/api/entries/bulk", post(handlers::replace_entries))
        .route("/api/stats", get(handlers::get_stats))
        .layer(middleware::from_fn(log_request))
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(frontend_url: &str) -> Option<CorsLayer> {
    let origin = frontend_url.trim_end_matches('/');
    match HeaderValue::from_str(origin) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        ),
        Err(err) => {
            warn!("FRONTEND_URL is not a valid origin, CORS disabled: {err}");
            None
        }
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    info!(method = %request.method(), path = %request.uri().path(), "request");
    next.run(request).await
}
