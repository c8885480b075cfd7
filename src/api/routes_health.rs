use crate::api::AppState;
use crate::engine::LoadStatus;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub total_books: usize,
    pub version: String,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().as_secs();
    let version = env!("CARGO_PKG_VERSION").to_string();
    match state.engine.get() {
        Ok(engine) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                total_books: engine.total(),
                version,
                uptime_secs,
            }),
        ),
        Err(_) => {
            let status = match state.engine.status() {
                LoadStatus::Failed => "failed",
                _ => "loading",
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: status.to_string(),
                    total_books: 0,
                    version,
                    uptime_secs,
                }),
            )
        }
    }
}
