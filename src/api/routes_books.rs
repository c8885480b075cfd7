use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::catalog::BookRecord;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub books: Vec<BookRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RandomParams {
    pub count: Option<i64>,
}

pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params.map_err(|err| ApiError::invalid_argument(err.body_text()))?;
    let query = params
        .q
        .ok_or_else(|| ApiError::invalid_argument("query parameter `q` is required"))?;
    let query_len = query.chars().count();
    if query_len == 0 || query_len > state.config.max_query_len {
        return Err(ApiError::invalid_argument(format!(
            "`q` must be 1-{} characters",
            state.config.max_query_len
        )));
    }
    let limit = bounded(
        params.limit,
        state.config.default_search_limit,
        state.config.max_search_limit,
        "limit",
    )?;

    let engine = state.engine.get()?;
    let books = engine.search(&query, limit);
    Ok(Json(SearchResponse {
        query,
        count: books.len(),
        books,
    }))
}

pub async fn random(
    State(state): State<AppState>,
    params: Result<Query<RandomParams>, QueryRejection>,
) -> Result<Json<Vec<BookRecord>>, ApiError> {
    let Query(params) = params.map_err(|err| ApiError::invalid_argument(err.body_text()))?;
    let count = bounded(
        params.count,
        state.config.default_random_count,
        state.config.max_random_count,
        "count",
    )?;
    let engine = state.engine.get()?;
    Ok(Json(engine.random(count)))
}

pub async fn get_book(
    State(state): State<AppState>,
    index: Result<Path<i64>, PathRejection>,
) -> Result<Json<BookRecord>, ApiError> {
    let Path(index) = index.map_err(|err| ApiError::invalid_argument(err.body_text()))?;
    let engine = state.engine.get()?;
    let book = engine
        .get(index)
        .map_err(|err| ApiError::from_engine(err, StatusCode::NOT_FOUND))?;
    Ok(Json(book))
}

fn bounded(raw: Option<i64>, default: usize, max: usize, name: &str) -> Result<usize, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    usize::try_from(raw)
        .ok()
        .filter(|value| (1..=max).contains(value))
        .ok_or_else(|| {
            ApiError::invalid_argument(format!("`{name}` must be between 1 and {max}"))
        })
}
