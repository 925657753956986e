use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use courier_llm::{
    resilient_chat, ChatClient, ChatRequest, ChatResponse, FallbackTarget, LlmError, Message,
    ProviderKind, RetryPolicy,
};

struct TimingOutClient {
    calls: AtomicU32,
}

impl TimingOutClient {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ChatClient for TimingOutClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::SiliconFlow
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Timeout(self.provider()))
    }
}

struct BrokenClient;

#[async_trait]
impl ChatClient for BrokenClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::SiliconFlow
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        Err(LlmError::Provider {
            provider: self.provider(),
            status: Some(400),
            message: "bad request".to_string(),
        })
    }
}

struct HangingClient;

#[async_trait]
impl ChatClient for HangingClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::SiliconFlow
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ChatResponse::default())
    }
}

struct EchoClient {
    provider: ProviderKind,
    reply: &'static str,
}

#[async_trait]
impl ChatClient for EchoClient {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse {
            content: Some(self.reply.to_string()),
            ..ChatResponse::default()
        })
    }
}

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(100),
        backoff: Duration::from_millis(1),
    }
}

fn request() -> ChatRequest {
    ChatRequest::new("deepseek-ai/DeepSeek-V2.5", vec![Message::human("hi")])
}

#[tokio::test]
async fn fallback_result_reports_secondary_provider() {
    let primary = TimingOutClient::new();
    let secondary = EchoClient {
        provider: ProviderKind::Groq,
        reply: "from groq",
    };
    let target = FallbackTarget {
        provider: ProviderKind::Groq,
        model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
    };

    let completion = resilient_chat(&primary, request(), &quick_policy(), Some((&secondary, &target)))
        .await
        .unwrap();

    assert_eq!(completion.provider, ProviderKind::Groq);
    assert_eq!(completion.model, target.model);
    assert_eq!(completion.text.as_deref(), Some("from groq"));
    assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retryable_errors_exhaust_all_attempts() {
    let primary = TimingOutClient::new();
    let policy = RetryPolicy {
        max_attempts: 3,
        ..quick_policy()
    };

    let error = resilient_chat(&primary, request(), &policy, None)
        .await
        .unwrap_err();

    assert!(matches!(error, LlmError::Timeout(ProviderKind::SiliconFlow)));
    assert_eq!(primary.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn non_retryable_error_surfaces_immediately() {
    let secondary = EchoClient {
        provider: ProviderKind::Groq,
        reply: "unused",
    };
    let target = FallbackTarget {
        provider: ProviderKind::Groq,
        model: "m".to_string(),
    };

    let error = resilient_chat(&BrokenClient, request(), &quick_policy(), Some((&secondary, &target)))
        .await
        .unwrap_err();

    assert!(matches!(error, LlmError::Provider { status: Some(400), .. }));
}

#[tokio::test]
async fn hanging_call_is_cut_by_attempt_timeout() {
    let secondary = EchoClient {
        provider: ProviderKind::Groq,
        reply: "rescued",
    };
    let target = FallbackTarget {
        provider: ProviderKind::Groq,
        model: "m".to_string(),
    };

    let completion = resilient_chat(
        &HangingClient,
        request(),
        &quick_policy(),
        Some((&secondary, &target)),
    )
    .await
    .unwrap();

    assert_eq!(completion.text.as_deref(), Some("rescued"));
    assert_eq!(completion.provider, ProviderKind::Groq);
}

#[tokio::test]
async fn success_keeps_primary_annotation() {
    let primary = EchoClient {
        provider: ProviderKind::SiliconFlow,
        reply: "直接回答",
    };

    let completion = resilient_chat(&primary, request(), &quick_policy(), None)
        .await
        .unwrap();

    assert_eq!(completion.provider, ProviderKind::SiliconFlow);
    assert_eq!(completion.model, "deepseek-ai/DeepSeek-V2.5");
    assert!(!completion.requires_tool_execution());
}
