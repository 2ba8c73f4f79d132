use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health, upload};
use crate::state::AppState;

/// Creates the application router.
///
/// Routes: `/` and `/health` for liveness, `/chat` for questions and
/// `/upload` for PDF ingestion. CORS and request tracing wrap everything;
/// bodies are capped at `server.max_upload_bytes`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_allowed_origins);
    let max_body = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/upload", post(upload::upload))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// Any origin when the list is empty, otherwise exactly the listed origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    let allow_origin = if allowed.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
}
