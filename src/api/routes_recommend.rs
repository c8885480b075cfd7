use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::engine::Recommendations;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendBody {
    pub book_index: i64,
    pub top_k: Option<i64>,
}

/// `top_k` is clamped into `1..=max_top_k`; a bad `book_index` is a client error.
pub async fn recommend(
    State(state): State<AppState>,
    body: Result<Json<RecommendBody>, JsonRejection>,
) -> Result<Json<Recommendations>, ApiError> {
    let Json(body) = body.map_err(|err| ApiError::invalid_argument(err.body_text()))?;
    let max_top_k = state.config.max_top_k.max(1);
    let top_k = body
        .top_k
        .map(|k| k.clamp(1, max_top_k as i64) as usize)
        .unwrap_or(state.config.default_top_k)
        .clamp(1, max_top_k);

    let engine = state.engine.get()?;
    let recommendations = engine.recommend(body.book_index, top_k)?;
    Ok(Json(recommendations))
}
