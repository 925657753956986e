pub mod chat;
pub mod health;
pub mod models;
pub mod search;
pub mod sessions;
pub mod transcribe;
pub mod upload;
