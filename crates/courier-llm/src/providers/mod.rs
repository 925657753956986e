mod audio;
mod groq;
mod openai;
mod siliconflow;
pub(crate) mod wire;

pub use groq::GroqClient;
pub use openai::OpenAIClient;
pub use siliconflow::SiliconFlowClient;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::traits::{ChatClient, TranscriptionClient};

/// External vendor reached over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    SiliconFlow,
    Groq,
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SiliconFlow => "siliconflow",
            Self::Groq => "groq",
            Self::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clients constructed once at startup from whichever API keys are
/// configured, then shared read-only across requests.
#[derive(Default, Clone)]
pub struct ProviderSet {
    chat_clients: HashMap<ProviderKind, Arc<dyn ChatClient>>,
    transcribers: Vec<Arc<dyn TranscriptionClient>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the production set. A missing key leaves the matching
    /// capability unconfigured rather than failing startup.
    pub fn from_keys(
        siliconflow_key: Option<&str>,
        groq_key: Option<&str>,
        openai_key: Option<&str>,
    ) -> Result<Self> {
        let mut set = Self::new();

        if let Some(key) = siliconflow_key.filter(|k| !k.is_empty()) {
            set.chat_clients.insert(
                ProviderKind::SiliconFlow,
                Arc::new(SiliconFlowClient::new(key)?),
            );
        }
        if let Some(key) = groq_key.filter(|k| !k.is_empty()) {
            let groq = Arc::new(GroqClient::new(key)?);
            set.chat_clients.insert(ProviderKind::Groq, groq.clone());
            set.transcribers.push(groq);
        }
        if let Some(key) = openai_key.filter(|k| !k.is_empty()) {
            set.transcribers.push(Arc::new(OpenAIClient::new(key)?));
        }

        Ok(set)
    }

    /// Registers a chat client, replacing any existing one for that provider.
    pub fn with_chat(mut self, kind: ProviderKind, client: Arc<dyn ChatClient>) -> Self {
        self.chat_clients.insert(kind, client);
        self
    }

    pub fn with_transcriber(mut self, client: Arc<dyn TranscriptionClient>) -> Self {
        self.transcribers.push(client);
        self
    }

    pub fn has_chat(&self, kind: ProviderKind) -> bool {
        self.chat_clients.contains_key(&kind)
    }

    pub fn has_transcription(&self) -> bool {
        !self.transcribers.is_empty()
    }

    pub fn chat(&self, kind: ProviderKind) -> Result<Arc<dyn ChatClient>> {
        self.chat_clients
            .get(&kind)
            .cloned()
            .ok_or_else(|| LlmError::Unconfigured(kind.to_string()))
    }

    /// Transcription clients in fallback order (fastest first).
    pub fn transcribers(&self) -> Vec<Arc<dyn TranscriptionClient>> {
        self.transcribers.clone()
    }
}
