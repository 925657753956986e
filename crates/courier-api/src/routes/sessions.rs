use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use courier_store::{MessageHit, Session, StoreStats, StoredMessage};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,

    #[serde(default)]
    pub include_archived: bool,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub success: bool,
    pub sessions: Vec<Session>,
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<SessionListResponse>> {
    let limit = query.limit.clamp(1, 200);
    let sessions = state
        .store
        .list_sessions(limit, query.offset.max(0), query.include_archived)
        .await?;
    Ok(Json(SessionListResponse {
        success: true,
        sessions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: Session,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionBody>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.store.create_session(body.title, body.model).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            session,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub success: bool,
    pub session: Session,
    pub messages: Vec<StoredMessage>,
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionDetailResponse>> {
    let session = state
        .store
        .get_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::SessionNotFound(session_id.clone()))?;
    let messages = state.store.messages(&session_id, 500, 0).await?;

    Ok(Json(SessionDetailResponse {
        success: true,
        session,
        messages,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RenameSessionBody {
    pub title: String,
}

pub async fn rename_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<RenameSessionBody>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("标题不能为空".to_string()));
    }
    state.store.rename_session(&session_id, &body.title).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.store.delete_session(&session_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn archive_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.store.archive_session(&session_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct SearchMessagesQuery {
    pub q: String,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageSearchResponse {
    pub success: bool,
    pub hits: Vec<MessageHit>,
}

pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchMessagesQuery>,
) -> ApiResult<Json<MessageSearchResponse>> {
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest("搜索词不能为空".to_string()));
    }
    let hits = state
        .store
        .search_messages(&query.q, query.session_id, query.limit.clamp(1, 200))
        .await?;
    Ok(Json(MessageSearchResponse {
        success: true,
        hits,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,

    #[serde(flatten)]
    pub stats: StoreStats,
}

pub async fn statistics(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.store.statistics().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
