use thiserror::Error;

use courier_llm::LlmError;
use courier_search::SearchError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("消息不能为空")]
    EmptyMessages,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Search(#[from] SearchError),
}
