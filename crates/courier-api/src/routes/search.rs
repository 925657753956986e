use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use courier_search::{resolve_relative_dates, SearchError, SearchProvider, SearchResponse};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_RESULT_COUNT: u32 = 5;
const MAX_RESULT_COUNT: u32 = 20;

#[derive(Debug, Serialize)]
pub struct SearchReply {
    pub success: bool,

    #[serde(flatten)]
    pub response: SearchResponse,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,

    #[serde(default)]
    pub count: Option<u32>,

    #[serde(default)]
    pub freshness: Option<String>,
}

/// Raw web-search passthrough (GET).
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchReply>> {
    run_search(&state, &query.q, query.count, query.freshness.as_deref()).await
}

#[derive(Debug, Deserialize)]
pub struct SearchWebBody {
    pub query: String,

    #[serde(default)]
    pub count: Option<u32>,

    #[serde(default)]
    pub freshness: Option<String>,
}

/// Raw web-search passthrough (POST).
pub async fn search_web(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchWebBody>,
) -> ApiResult<Json<SearchReply>> {
    run_search(&state, &body.query, body.count, body.freshness.as_deref()).await
}

async fn run_search(
    state: &AppState,
    query: &str,
    count: Option<u32>,
    freshness: Option<&str>,
) -> ApiResult<Json<SearchReply>> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("搜索词不能为空".to_string()));
    }
    let client = state.search.as_ref().ok_or(SearchError::Unconfigured)?;

    let resolved = resolve_relative_dates(query, Local::now().date_naive());
    let count = count.unwrap_or(DEFAULT_RESULT_COUNT).clamp(1, MAX_RESULT_COUNT);
    let response = client.search(&resolved, count, freshness).await?;

    Ok(Json(SearchReply {
        success: true,
        response,
    }))
}
