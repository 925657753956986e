use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("video decoding unavailable: {0}")]
    ExtractionUnavailable(String),

    #[error("frame extraction failed: {0}")]
    Extraction(String),
}
