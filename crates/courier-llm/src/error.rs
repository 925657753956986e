use thiserror::Error;

use crate::providers::ProviderKind;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("{0} is not configured")]
    Unconfigured(String),

    #[error("invalid {0} API key")]
    InvalidKey(ProviderKind),

    #[error("{0} request timed out")]
    Timeout(ProviderKind),

    #[error("{provider} connection failed: {message}")]
    Connection {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} API error: {message}")]
    Provider {
        provider: ProviderKind,
        status: Option<u16>,
        message: String,
    },

    #[error("failed to parse {provider} response: {message}")]
    Parse {
        provider: ProviderKind,
        message: String,
    },
}

impl LlmError {
    /// Timeouts and connection failures are worth another attempt;
    /// everything else is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection { .. })
    }

    pub(crate) fn from_reqwest(provider: ProviderKind, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(provider)
        } else if error.is_connect() {
            Self::Connection {
                provider,
                message: error.to_string(),
            }
        } else if error.is_decode() {
            Self::Parse {
                provider,
                message: error.to_string(),
            }
        } else {
            Self::Provider {
                provider,
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
