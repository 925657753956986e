//! OpenAI-compatible chat-completions wire format shared by the chat
//! providers. SiliconFlow and Groq speak the same protocol; only the host,
//! the auth header, and the completion-token field name differ.

use serde::Deserialize;
use serde_json::Value;

use super::ProviderKind;
use crate::error::{LlmError, Result};
use crate::traits::{ChatOptions, ChatResponse, TokenUsage};
use crate::types::{Content, Message, ToolCall};

/// Field carrying the completion-token ceiling. Groq's OpenAI surface uses
/// `max_completion_tokens`; SiliconFlow keeps the original `max_tokens`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TokenField {
    MaxTokens,
    MaxCompletionTokens,
}

impl TokenField {
    fn as_str(&self) -> &'static str {
        match self {
            Self::MaxTokens => "max_tokens",
            Self::MaxCompletionTokens => "max_completion_tokens",
        }
    }
}

pub(crate) fn build_chat_payload(
    provider: ProviderKind,
    model: &str,
    messages: Vec<Message>,
    options: &ChatOptions,
    token_field: TokenField,
) -> Result<Value> {
    let wire_messages: Vec<Value> = messages
        .into_iter()
        .map(|message| convert_message(provider, message))
        .collect::<Result<Vec<_>>>()?;

    let mut request = serde_json::json!({
        "model": model,
        "messages": wire_messages,
        "stream": false,
    });

    let obj = request.as_object_mut().unwrap();

    if let Some(temp) = options.temperature {
        obj.insert("temperature".to_string(), serde_json::json!(temp));
    }
    if let Some(max_tokens) = options.max_tokens {
        obj.insert(token_field.as_str().to_string(), serde_json::json!(max_tokens));
    }
    if let Some(tools) = &options.tools {
        obj.insert("tools".to_string(), to_value(provider, tools)?);
    }
    if let Some(tool_choice) = &options.tool_choice {
        obj.insert("tool_choice".to_string(), to_value(provider, tool_choice)?);
    }

    Ok(request)
}

fn convert_message(provider: ProviderKind, message: Message) -> Result<Value> {
    match message {
        Message::System { content } => Ok(serde_json::json!({
            "role": "system",
            "content": convert_content(provider, content)?,
        })),
        Message::Human { content } => Ok(serde_json::json!({
            "role": "user",
            "content": convert_content(provider, content)?,
        })),
        Message::AI {
            content,
            tool_calls,
        } => {
            let mut obj = serde_json::json!({ "role": "assistant" });
            let map = obj.as_object_mut().unwrap();
            if let Some(content) = content {
                map.insert("content".to_string(), convert_content(provider, content)?);
            }
            if let Some(tool_calls) = tool_calls {
                map.insert("tool_calls".to_string(), to_value(provider, &tool_calls)?);
            }
            Ok(obj)
        }
        Message::Tool {
            tool_call_id,
            content,
        } => Ok(serde_json::json!({
            "role": "tool",
            "tool_call_id": tool_call_id,
            "content": convert_content(provider, content)?,
        })),
    }
}

fn convert_content(provider: ProviderKind, content: Content) -> Result<Value> {
    match content {
        Content::Text(s) => Ok(serde_json::json!(s)),
        // ContentPart serializes directly to the wire shape
        // ({"type":"text",...} / {"type":"image_url",...}).
        Content::Parts(parts) => to_value(provider, &parts),
    }
}

fn to_value<T: serde::Serialize>(provider: ProviderKind, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| LlmError::Parse {
        provider,
        message: e.to_string(),
    })
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatResponse {
    pub choices: Vec<WireChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChoice {
    pub message: WireMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

pub(crate) fn into_chat_response(raw: WireChatResponse) -> ChatResponse {
    let usage = raw.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });
    let choice = raw.choices.into_iter().next();

    match choice {
        Some(choice) => ChatResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
            usage,
            finish_reason: choice.finish_reason,
        },
        None => ChatResponse {
            usage,
            ..ChatResponse::default()
        },
    }
}
