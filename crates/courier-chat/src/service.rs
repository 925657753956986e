use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use courier_llm::{
    resilient_chat, ChatOptions, ChatRequest, Content, Message, ModelRegistry, ProviderKind,
    ProviderSet, RetryPolicy,
};
use courier_media::{IncomingMessage, Normalizer, Role};
use courier_search::SearchProvider;
use courier_store::{ChatStore, ContentType, NewMessage};

use crate::augment::{AugmentedReply, Augmentor};
use crate::error::ChatError;

/// One chat turn as received from the HTTP boundary.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub messages: Vec<IncomingMessage>,
    pub model: Option<String>,
    pub session_id: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub enable_search: bool,
    pub tool_search: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    pub provider: ProviderKind,
    pub model: String,
    pub session_id: Option<String>,
    pub search_performed: bool,
}

#[derive(Debug, Clone)]
pub struct ChatDefaults {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Per-turn orchestrator: normalize media, select the model, run the
/// requested strategy, and persist the exchange best-effort.
pub struct ChatService {
    registry: Arc<ModelRegistry>,
    providers: Arc<ProviderSet>,
    normalizer: Arc<Normalizer>,
    augmentor: Option<Augmentor>,
    store: Arc<ChatStore>,
    policy: RetryPolicy,
    defaults: ChatDefaults,
}

impl ChatService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        providers: Arc<ProviderSet>,
        normalizer: Arc<Normalizer>,
        store: Arc<ChatStore>,
    ) -> Self {
        Self {
            registry,
            providers,
            normalizer,
            augmentor: None,
            store,
            policy: RetryPolicy::default(),
            defaults: ChatDefaults::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_defaults(mut self, defaults: ChatDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>, result_count: u32) -> Self {
        self.augmentor = Some(Augmentor::new(search).with_result_count(result_count));
        self
    }

    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutcome, ChatError> {
        if request.messages.is_empty() {
            return Err(ChatError::EmptyMessages);
        }

        // Capability flags come from the caller's original attachments.
        let has_image = request.messages.iter().any(|m| m.image.is_some());
        let has_other_media = request
            .messages
            .iter()
            .any(|m| m.audio.is_some() || m.video.is_some());

        let normalized = self.normalizer.normalize(request.messages.clone()).await;

        let selection =
            self.registry
                .select(request.model.as_deref(), has_image, has_other_media)?;
        if selection.overridden {
            info!(model = %selection.model, provider = %selection.provider, "capability override applied");
        }
        let supports_image = self
            .registry
            .get(&selection.model)
            .map(|descriptor| descriptor.supports_image)
            .unwrap_or(false);

        let client = self.providers.chat(selection.provider)?;
        let fallback_target = self
            .registry
            .fallback_for(selection.provider)
            .filter(|target| self.providers.has_chat(target.provider));
        let fallback_client = match &fallback_target {
            Some(target) => Some(self.providers.chat(target.provider)?),
            None => None,
        };
        let fallback = fallback_client
            .as_deref()
            .zip(fallback_target.as_ref());

        let llm_messages =
            build_llm_messages(&normalized, request.system_prompt.as_deref(), supports_image);
        let options = ChatOptions::new()
            .temperature(request.temperature.unwrap_or(self.defaults.temperature))
            .max_tokens(self.defaults.max_tokens);
        let chat_request =
            ChatRequest::new(selection.model.clone(), llm_messages).with_options(options);

        let today = Local::now().date_naive();
        let reply = match (&self.augmentor, request.tool_search, request.enable_search) {
            // When both mechanisms are requested, explicit tool calling wins.
            (Some(augmentor), true, _) => {
                augmentor
                    .tool_loop(client.as_ref(), chat_request, &self.policy, fallback, today)
                    .await?
            }
            (Some(augmentor), false, true) => {
                augmentor
                    .two_pass(client.as_ref(), chat_request, &self.policy, fallback, today)
                    .await?
            }
            _ => {
                if request.tool_search || request.enable_search {
                    warn!("search requested but no search backend is configured");
                }
                let completion =
                    resilient_chat(client.as_ref(), chat_request, &self.policy, fallback).await?;
                AugmentedReply::from_completion(completion, false)
            }
        };

        if let Some(session_id) = &request.session_id {
            self.persist_turn(session_id, &request.messages, &reply).await;
        }

        Ok(TurnOutcome {
            response: reply.text,
            provider: reply.provider,
            model: reply.model,
            session_id: request.session_id,
            search_performed: reply.search_performed,
        })
    }

    /// Persists exactly one user/assistant pair per completed turn.
    /// Storage failures are logged, never surfaced to the caller.
    async fn persist_turn(
        &self,
        session_id: &str,
        original_messages: &[IncomingMessage],
        reply: &AugmentedReply,
    ) {
        let Some(user) = original_messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
        else {
            return;
        };

        let (content_type, media_data) = if let Some(image) = &user.image {
            (ContentType::Image, Some(image.clone()))
        } else if let Some(audio) = &user.audio {
            (ContentType::Audio, Some(audio.clone()))
        } else if let Some(video) = &user.video {
            (ContentType::Video, Some(video.clone()))
        } else {
            (ContentType::Text, None)
        };

        let user_row = NewMessage {
            role: "user".to_string(),
            content: user.text.clone(),
            content_type,
            media_data,
            ..NewMessage::default()
        };
        if let Err(error) = self.store.append_message(session_id, user_row).await {
            warn!(error = %error, session_id, "failed to persist user message");
            return;
        }

        let assistant_row = NewMessage {
            role: "assistant".to_string(),
            content: reply.text.clone(),
            model: Some(reply.model.clone()),
            provider: Some(reply.provider.to_string()),
            ..NewMessage::default()
        };
        if let Err(error) = self.store.append_message(session_id, assistant_row).await {
            warn!(error = %error, session_id, "failed to persist assistant message");
        }
    }
}

fn build_llm_messages(
    messages: &[IncomingMessage],
    system_prompt: Option<&str>,
    supports_image: bool,
) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt {
        out.push(Message::system(prompt));
    }

    for message in messages {
        match message.role {
            Role::System => out.push(Message::system(message.text.clone())),
            Role::Assistant => out.push(Message::ai(message.text.clone())),
            Role::User => match (&message.image, supports_image) {
                (Some(image), true) => {
                    out.push(Message::human(Content::multimodal(&message.text, image)))
                }
                _ => out.push(Message::human(message.text.clone())),
            },
            // Tool transcripts are internal to a turn and never arrive
            // from the HTTP boundary.
            Role::Tool => {}
        }
    }

    out
}
