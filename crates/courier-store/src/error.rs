use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("internal storage error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
