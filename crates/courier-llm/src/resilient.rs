use std::time::Duration;

use tracing::warn;

use crate::error::{LlmError, Result};
use crate::providers::ProviderKind;
use crate::traits::{ChatClient, ChatRequest, ChatResponse, TokenUsage};
use crate::types::ToolCall;

/// Bounded-retry policy applied to every outbound chat call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(60),
            backoff: Duration::from_millis(500),
        }
    }
}

/// Secondary provider/model tried once after the primary gives up.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackTarget {
    pub provider: ProviderKind,
    pub model: String,
}

/// Provider call result annotated with whoever actually answered.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<TokenUsage>,
    pub provider: ProviderKind,
    pub model: String,
}

impl Completion {
    pub fn requires_tool_execution(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

/// Calls the primary client with bounded retries, then fails over to the
/// secondary target (one shot, no further retries) before giving up.
/// Only timeouts and connection failures are retried; everything else is
/// surfaced immediately.
pub async fn resilient_chat(
    primary: &dyn ChatClient,
    request: ChatRequest,
    policy: &RetryPolicy,
    fallback: Option<(&dyn ChatClient, &FallbackTarget)>,
) -> Result<Completion> {
    let mut attempt = 0;
    let primary_error = loop {
        attempt += 1;
        match attempt_chat(primary, &request, policy).await {
            Ok(response) => {
                return Ok(annotate(response, primary.provider(), &request.model));
            }
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                warn!(
                    provider = %primary.provider(),
                    attempt,
                    error = %error,
                    "chat attempt failed, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(error) if error.is_retryable() => break error,
            Err(error) => return Err(error),
        }
    };

    let Some((client, target)) = fallback else {
        return Err(primary_error);
    };

    warn!(
        from = %primary.provider(),
        to = %target.provider,
        error = %primary_error,
        "primary provider exhausted, failing over"
    );

    let mut fallback_request = request;
    fallback_request.model = target.model.clone();
    let response = attempt_chat(client, &fallback_request, policy).await?;
    Ok(annotate(response, target.provider, &target.model))
}

async fn attempt_chat(
    client: &dyn ChatClient,
    request: &ChatRequest,
    policy: &RetryPolicy,
) -> Result<ChatResponse> {
    match tokio::time::timeout(policy.attempt_timeout, client.chat(request.clone())).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(client.provider())),
    }
}

fn annotate(response: ChatResponse, provider: ProviderKind, model: &str) -> Completion {
    Completion {
        text: response.content,
        tool_calls: response.tool_calls,
        usage: response.usage,
        provider,
        model: model.to_string(),
    }
}
