pub mod errors;
mod routes_books;
mod routes_health;
mod routes_recommend;

pub use routes_books::SearchResponse;
pub use routes_health::HealthResponse;
pub use routes_recommend::RecommendBody;

use crate::config::Config;
use crate::engine::EngineSlot;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub engine: EngineSlot,
    pub config: Config,
    pub started_at: Instant,
}

pub fn router(engine: EngineSlot, config: Config) -> Router {
    let cors = cors_layer(&config.cors_origins);
    let state = AppState {
        engine,
        config,
        started_at: Instant::now(),
    };

    Router::new()
        .route("/health", get(routes_health::health))
        .route("/books/search", get(routes_books::search))
        .route("/books/random", get(routes_books::random))
        .route("/books/random/", get(routes_books::random))
        .route("/books/:book_index", get(routes_books::get_book))
        .route("/recommend", post(routes_recommend::recommend))
        .layer(cors)
        .with_state(state)
}

/// Any method and header; origins from config, where `*` allows every origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
