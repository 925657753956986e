use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("web search is not configured")]
    Unconfigured,

    #[error("search request timed out")]
    Timeout,

    #[error("search connection failed: {0}")]
    Connection(String),

    #[error("search API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse search response: {0}")]
    Parse(String),
}

impl SearchError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connection(error.to_string())
        } else if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Connection(error.to_string())
        }
    }
}
