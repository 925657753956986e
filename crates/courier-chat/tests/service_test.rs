use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use courier_chat::{ChatError, ChatService, TurnRequest};
use courier_llm::{
    ChatClient, ChatRequest, ChatResponse, LlmError, ModelRegistry, ProviderKind, ProviderSet,
    RetryPolicy,
};
use courier_media::{IncomingMessage, Normalizer, TranscriberChain};
use courier_store::ChatStore;

struct EchoClient {
    provider: ProviderKind,
    reply: &'static str,
    requests: Mutex<Vec<ChatRequest>>,
}

impl EchoClient {
    fn new(provider: ProviderKind, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            provider,
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatClient for EchoClient {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        Ok(ChatResponse {
            content: Some(self.reply.to_string()),
            ..ChatResponse::default()
        })
    }
}

struct FailingClient {
    provider: ProviderKind,
}

#[async_trait]
impl ChatClient for FailingClient {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        Err(LlmError::Timeout(self.provider))
    }
}

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(200),
        backoff: Duration::from_millis(1),
    }
}

async fn service_with(
    providers: ProviderSet,
    store: Arc<ChatStore>,
) -> ChatService {
    ChatService::new(
        Arc::new(ModelRegistry::builtin()),
        Arc::new(providers),
        Arc::new(Normalizer::new(TranscriberChain::default())),
        store,
    )
    .with_policy(quick_policy())
}

#[tokio::test]
async fn empty_message_list_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ChatStore::open(dir.path().join("c.db")).await.unwrap());
    let providers = ProviderSet::new().with_chat(
        ProviderKind::SiliconFlow,
        EchoClient::new(ProviderKind::SiliconFlow, "hi"),
    );
    let service = service_with(providers, store).await;

    let error = service.run_turn(TurnRequest::default()).await.unwrap_err();
    assert!(matches!(error, ChatError::EmptyMessages));
}

#[tokio::test]
async fn completed_turn_persists_exactly_one_message_pair() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ChatStore::open(dir.path().join("c.db")).await.unwrap());
    let providers = ProviderSet::new().with_chat(
        ProviderKind::SiliconFlow,
        EchoClient::new(ProviderKind::SiliconFlow, "你好！"),
    );
    let service = service_with(providers, store.clone()).await;

    let session = store.create_session(None, None).await.unwrap();
    let outcome = service
        .run_turn(TurnRequest {
            messages: vec![IncomingMessage::user("你好")],
            session_id: Some(session.id.clone()),
            ..TurnRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.response, "你好！");
    assert_eq!(outcome.provider, ProviderKind::SiliconFlow);
    assert_eq!(outcome.session_id.as_deref(), Some(session.id.as_str()));

    let messages = store.messages(&session.id, 100, 0).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[0].content, "你好");
    assert_eq!(messages[1].role, "assistant");
    assert_eq!(messages[1].content, "你好！");
    assert_eq!(messages[1].provider.as_deref(), Some("siliconflow"));
    assert!(messages[0].created_at <= messages[1].created_at);
}

#[tokio::test]
async fn image_turn_is_routed_to_the_multimodal_provider() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ChatStore::open(dir.path().join("c.db")).await.unwrap());
    let groq = EchoClient::new(ProviderKind::Groq, "这张图里是一只猫。");
    let providers = ProviderSet::new()
        .with_chat(
            ProviderKind::SiliconFlow,
            EchoClient::new(ProviderKind::SiliconFlow, "unused"),
        )
        .with_chat(ProviderKind::Groq, groq.clone());
    let service = service_with(providers, store).await;

    let mut message = IncomingMessage::user("这是什么？");
    message.image = Some("data:image/png;base64,AAAA".to_string());

    let outcome = service
        .run_turn(TurnRequest {
            messages: vec![message],
            model: Some("deepseek-ai/DeepSeek-V2.5".to_string()),
            ..TurnRequest::default()
        })
        .await
        .unwrap();

    // Capability override is silent except through these fields.
    assert_eq!(outcome.provider, ProviderKind::Groq);
    assert_eq!(outcome.model, "meta-llama/llama-4-scout-17b-16e-instruct");
    assert_eq!(groq.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn primary_exhaustion_fails_over_to_other_provider() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ChatStore::open(dir.path().join("c.db")).await.unwrap());
    let groq = EchoClient::new(ProviderKind::Groq, "groq 顶上");
    let providers = ProviderSet::new()
        .with_chat(
            ProviderKind::SiliconFlow,
            Arc::new(FailingClient {
                provider: ProviderKind::SiliconFlow,
            }),
        )
        .with_chat(ProviderKind::Groq, groq);
    let service = service_with(providers, store).await;

    let outcome = service
        .run_turn(TurnRequest {
            messages: vec![IncomingMessage::user("hi")],
            ..TurnRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.provider, ProviderKind::Groq);
    assert_eq!(outcome.response, "groq 顶上");
}

#[tokio::test]
async fn unknown_model_is_rejected_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ChatStore::open(dir.path().join("c.db")).await.unwrap());
    let providers = ProviderSet::new().with_chat(
        ProviderKind::SiliconFlow,
        EchoClient::new(ProviderKind::SiliconFlow, "unused"),
    );
    let service = service_with(providers, store).await;

    let error = service
        .run_turn(TurnRequest {
            messages: vec![IncomingMessage::user("hi")],
            model: Some("no/such-model".to_string()),
            ..TurnRequest::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ChatError::Llm(LlmError::UnknownModel(id)) if id == "no/such-model"
    ));
}

#[tokio::test]
async fn storage_failure_does_not_fail_the_reply() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ChatStore::open(dir.path().join("c.db")).await.unwrap());
    let providers = ProviderSet::new().with_chat(
        ProviderKind::SiliconFlow,
        EchoClient::new(ProviderKind::SiliconFlow, "答复"),
    );
    let service = service_with(providers, store).await;

    // Session was never created, so persistence fails quietly.
    let outcome = service
        .run_turn(TurnRequest {
            messages: vec![IncomingMessage::user("hi")],
            session_id: Some("ghost-session".to_string()),
            ..TurnRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.response, "答复");
}
