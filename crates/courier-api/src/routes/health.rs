use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use courier_llm::ProviderKind;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub version: String,
    pub capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
pub struct HealthCapabilities {
    pub siliconflow_available: bool,
    pub groq_available: bool,
    pub openai_available: bool,
    pub search_available: bool,
    pub multimodal_support: bool,
}

/// Health check. Derived only from which keys were configured at startup,
/// so repeated calls return identical flags.
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let groq = state.providers.has_chat(ProviderKind::Groq);
    Ok(Json(HealthResponse {
        success: true,
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: HealthCapabilities {
            siliconflow_available: state.providers.has_chat(ProviderKind::SiliconFlow),
            groq_available: groq,
            openai_available: state.config.openai_api_key.is_some(),
            search_available: state.search.is_some(),
            multimodal_support: groq,
        },
    }))
}
