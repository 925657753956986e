use std::sync::Arc;

use tracing::warn;

use courier_llm::{LlmError, Transcript, TranscriptionClient, TranscriptionRequest};

/// Ordered speech-to-text chain: the fast provider first, then the backup.
/// The last provider's error is reported when every attempt fails.
#[derive(Clone, Default)]
pub struct TranscriberChain {
    clients: Vec<Arc<dyn TranscriptionClient>>,
}

impl TranscriberChain {
    pub fn new(clients: Vec<Arc<dyn TranscriptionClient>>) -> Self {
        Self { clients }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: Option<String>,
    ) -> Result<Transcript, LlmError> {
        let mut last_error = None;

        for client in &self.clients {
            let request = TranscriptionRequest::new(audio.clone(), file_name, language.clone());
            match client.transcribe(request).await {
                Ok(transcript) => return Ok(transcript),
                Err(error) => {
                    warn!(
                        provider = %client.provider(),
                        error = %error,
                        "transcription attempt failed"
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Unconfigured("speech-to-text".to_string())))
    }
}
