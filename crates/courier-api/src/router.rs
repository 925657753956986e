use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::middleware::logging;
use crate::routes::{chat, health, models, search, sessions, transcribe, upload};
use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/models", get(models::list_models))
        .route("/chat", post(chat::chat))
        .route("/chat/search", post(chat::chat_with_search))
        .route("/upload", post(upload::upload_image))
        .route("/upload/audio", post(upload::upload_audio))
        .route("/upload/video", post(upload::upload_video))
        .route("/upload/record", post(upload::upload_record))
        .route("/transcribe", post(transcribe::transcribe))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/:session_id",
            get(sessions::get_session)
                .put(sessions::rename_session)
                .delete(sessions::delete_session),
        )
        .route("/sessions/:session_id/archive", post(sessions::archive_session))
        .route("/messages/search", get(sessions::search_messages))
        .route("/stats", get(sessions::statistics))
        .route("/search", get(search::search))
        .route("/search/web", post(search::search_web))
        .route("/health", get(health::health_check));

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &crate::config::Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_origin(Any);
        } else {
            for origin in &config.cors.origins {
                if let Ok(parsed_origin) = origin.parse::<axum::http::HeaderValue>() {
                    cors = cors.allow_origin(parsed_origin);
                }
            }
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}
