use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use courier_chat::{TurnOutcome, TurnRequest};
use courier_llm::ProviderKind;
use courier_media::IncomingMessage;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub messages: Vec<IncomingMessage>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// Two-pass sentinel search mode.
    #[serde(default)]
    pub enable_search: bool,

    /// Explicit tool-calling search mode; wins when both are set.
    #[serde(default)]
    pub tool_search: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub provider: ProviderKind,
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    pub search_performed: bool,
}

impl From<TurnOutcome> for ChatReply {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            success: true,
            response: outcome.response,
            provider: outcome.provider,
            model: outcome.model,
            session_id: outcome.session_id,
            search_performed: outcome.search_performed,
        }
    }
}

/// Full chat endpoint: multi-message transcript, optional media, optional
/// search augmentation.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> ApiResult<Json<ChatReply>> {
    let outcome = state
        .chat
        .run_turn(TurnRequest {
            messages: body.messages,
            model: body.model,
            session_id: body.session_id,
            system_prompt: body.system_prompt,
            temperature: body.temperature,
            enable_search: body.enable_search,
            tool_search: body.tool_search,
        })
        .await?;

    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct SearchChatBody {
    pub message: String,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_true")]
    pub auto_search: bool,
}

fn default_true() -> bool {
    true
}

/// Single-message convenience over the two-pass search controller.
pub async fn chat_with_search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchChatBody>,
) -> ApiResult<Json<ChatReply>> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("消息不能为空".to_string()));
    }

    let outcome = state
        .chat
        .run_turn(TurnRequest {
            messages: vec![IncomingMessage::user(body.message)],
            model: body.model,
            session_id: body.session_id,
            enable_search: body.auto_search,
            ..TurnRequest::default()
        })
        .await?;

    Ok(Json(outcome.into()))
}
