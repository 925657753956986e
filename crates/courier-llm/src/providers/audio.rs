//! Shared speech-to-text call for the OpenAI-style `audio/transcriptions`
//! endpoint (multipart upload, JSON reply).

use serde::Deserialize;

use super::ProviderKind;
use crate::error::{LlmError, Result};
use crate::traits::{Transcript, TranscriptionRequest};

#[derive(Debug, Deserialize)]
struct TranscriptionReply {
    text: String,
}

pub(crate) async fn post_transcription(
    http_client: &reqwest::Client,
    provider: ProviderKind,
    url: String,
    model: &str,
    request: TranscriptionRequest,
) -> Result<Transcript> {
    let file = reqwest::multipart::Part::bytes(request.audio).file_name(request.file_name);
    let mut form = reqwest::multipart::Form::new()
        .part("file", file)
        .text("model", model.to_string())
        .text("response_format", "json");
    if let Some(language) = request.language {
        form = form.text("language", language);
    }

    let response = http_client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| LlmError::from_reqwest(provider, e))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        return Err(LlmError::Provider {
            provider,
            status: Some(status),
            message: error_text,
        });
    }

    let raw: TranscriptionReply = response.json().await.map_err(|e| LlmError::Parse {
        provider,
        message: e.to_string(),
    })?;

    Ok(Transcript {
        text: raw.text,
        provider,
    })
}
