use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::audio::post_transcription;
use super::wire::{self, TokenField};
use super::ProviderKind;
use crate::error::{LlmError, Result};
use crate::traits::{
    ChatClient, ChatRequest, ChatResponse, Transcript, TranscriptionClient, TranscriptionRequest,
};

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GROQ_WHISPER_MODEL: &str = "whisper-large-v3-turbo";

/// Groq client. Chat goes through the OpenAI-compatible surface (this is
/// the multimodal back end); transcription uses the hosted whisper model.
pub struct GroqClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| LlmError::InvalidKey(ProviderKind::Groq))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Connection {
                provider: ProviderKind::Groq,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            base_url: GROQ_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatClient for GroqClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = wire::build_chat_payload(
            self.provider(),
            &request.model,
            request.messages,
            &request.options,
            TokenField::MaxCompletionTokens,
        )?;

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(self.provider(), e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                provider: self.provider(),
                status: Some(status),
                message: error_text,
            });
        }

        let raw: wire::WireChatResponse = response.json().await.map_err(|e| LlmError::Parse {
            provider: self.provider(),
            message: e.to_string(),
        })?;

        Ok(wire::into_chat_response(raw))
    }
}

#[async_trait]
impl TranscriptionClient for GroqClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<Transcript> {
        post_transcription(
            &self.http_client,
            self.provider(),
            format!("{}/audio/transcriptions", self.base_url),
            GROQ_WHISPER_MODEL,
            request,
        )
        .await
    }
}
