use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use courier_llm::{ModelDescriptor, ProviderKind};

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub success: bool,
    pub models: Vec<ModelDescriptor>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub text_chat: bool,
    pub image_analysis: bool,
    pub multimodal: bool,
    pub web_search: bool,
    pub transcription: bool,
}

pub(crate) fn capabilities(state: &AppState) -> Capabilities {
    let siliconflow = state.providers.has_chat(ProviderKind::SiliconFlow);
    let groq = state.providers.has_chat(ProviderKind::Groq);
    Capabilities {
        text_chat: siliconflow || groq,
        image_analysis: groq,
        multimodal: groq,
        web_search: state.search.is_some(),
        transcription: state.providers.has_transcription(),
    }
}

/// List selectable models together with the system's capability flags.
pub async fn list_models(State(state): State<Arc<AppState>>) -> ApiResult<Json<ModelsResponse>> {
    Ok(Json(ModelsResponse {
        success: true,
        models: state.registry.models().to_vec(),
        capabilities: capabilities(&state),
    }))
}
