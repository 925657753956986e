use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use super::audio::post_transcription;
use super::ProviderKind;
use crate::error::{LlmError, Result};
use crate::traits::{Transcript, TranscriptionClient, TranscriptionRequest};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const OPENAI_WHISPER_MODEL: &str = "whisper-1";

/// OpenAI client, used here only as the whisper transcription fallback.
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| LlmError::InvalidKey(ProviderKind::OpenAI))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Connection {
                provider: ProviderKind::OpenAI,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TranscriptionClient for OpenAIClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<Transcript> {
        post_transcription(
            &self.http_client,
            self.provider(),
            format!("{}/audio/transcriptions", self.base_url),
            OPENAI_WHISPER_MODEL,
            request,
        )
        .await
    }
}
