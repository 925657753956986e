pub mod error;
pub mod models;
mod store;

pub use error::StoreError;
pub use models::{ContentType, MessageHit, NewMessage, Session, StoreStats, StoredMessage};
pub use store::ChatStore;
