use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use courier_llm::ProviderKind;
use courier_media::data_uri::{audio_extension, DataUri};

use crate::routes::upload::MAX_AUDIO_BYTES;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TranscribeBody {
    pub audio_data: String,

    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscribeReply {
    pub success: bool,
    pub text: String,
    pub provider: ProviderKind,
}

/// Dedicated speech-to-text endpoint.
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TranscribeBody>,
) -> ApiResult<Json<TranscribeReply>> {
    let parsed = DataUri::parse(&body.audio_data)
        .map_err(|e| ApiError::BadRequest(format!("无效的音频数据: {e}")))?;
    if parsed.data.is_empty() {
        return Err(ApiError::BadRequest("音频文件为空".to_string()));
    }
    if parsed.data.len() > MAX_AUDIO_BYTES {
        return Err(ApiError::BadRequest("音频文件太大，不能超过10MB".to_string()));
    }

    let file_name = format!("audio.{}", audio_extension(&parsed.mime));
    let transcript = state
        .transcriber
        .transcribe(parsed.data, &file_name, body.language)
        .await?;

    Ok(Json(TranscribeReply {
        success: true,
        text: transcript.text,
        provider: transcript.provider,
    }))
}
