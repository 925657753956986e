use base64::{engine::general_purpose, Engine as _};

use crate::error::MediaError;

/// An inline `data:<mime>;base64,<payload>` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<Self, MediaError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| MediaError::InvalidDataUri("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| MediaError::InvalidDataUri("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| MediaError::InvalidDataUri("missing base64 marker".to_string()))?;
        if mime.is_empty() {
            return Err(MediaError::InvalidDataUri("missing media type".to_string()));
        }

        let data = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| MediaError::InvalidDataUri(format!("bad base64 payload: {e}")))?;

        Ok(Self {
            mime: mime.to_string(),
            data,
        })
    }

    pub fn encode(mime: &str, data: &[u8]) -> String {
        format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(data))
    }

    pub fn is_data_uri(value: &str) -> bool {
        value.starts_with("data:")
    }
}

/// File extension matching an audio MIME type, for providers that sniff the
/// uploaded file name.
pub fn audio_extension(mime: &str) -> &'static str {
    match mime {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/flac" => "flac",
        "audio/aac" => "aac",
        _ => "bin",
    }
}
