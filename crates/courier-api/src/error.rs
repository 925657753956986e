use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use courier_chat::ChatError;
use courier_llm::LlmError;
use courier_search::SearchError;
use courier_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("会话不存在: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Chat(ChatError::EmptyMessages) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Chat(ChatError::Llm(error)) | ApiError::Llm(error) => llm_status(error),
            ApiError::Chat(ChatError::Search(error)) | ApiError::Search(error) => {
                search_status(error)
            }
            ApiError::Store(StoreError::SessionNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("会话不存在: {id}"))
            }
            ApiError::Store(error) => {
                tracing::error!(error = %error, "storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "存储服务错误".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

fn llm_status(error: &LlmError) -> (StatusCode, String) {
    match error {
        LlmError::UnknownModel(_) => (StatusCode::BAD_REQUEST, error.to_string()),
        LlmError::Unconfigured(_) | LlmError::InvalidKey(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, error.to_string())
        }
        LlmError::Timeout(_) | LlmError::Connection { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, error.to_string())
        }
        LlmError::Provider { .. } | LlmError::Parse { .. } => {
            tracing::error!(error = %error, "provider error");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

fn search_status(error: &SearchError) -> (StatusCode, String) {
    match error {
        SearchError::Unconfigured => (StatusCode::SERVICE_UNAVAILABLE, error.to_string()),
        SearchError::Timeout => (StatusCode::GATEWAY_TIMEOUT, error.to_string()),
        _ => {
            tracing::error!(error = %error, "search error");
            (StatusCode::BAD_GATEWAY, error.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
