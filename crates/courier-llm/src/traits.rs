use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::providers::ProviderKind;
use crate::types::{Message, Tool, ToolCall, ToolChoice};

/// Trait for chat-completion providers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Provider identity, used for retry bookkeeping and result annotation.
    fn provider(&self) -> ProviderKind;

    /// Non-streaming chat completion.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Trait for speech-to-text providers.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<Transcript>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// True when the model asked for tools to be executed instead of
    /// answering in plain text.
    pub fn requires_tool_execution(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
    pub file_name: String,
    pub language: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(audio: Vec<u8>, file_name: impl Into<String>, language: Option<String>) -> Self {
        Self {
            audio,
            file_name: file_name.into(),
            language,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub provider: ProviderKind,
}
