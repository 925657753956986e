pub mod augment;
pub mod error;
pub mod service;

pub use augment::{parse_judgement, AugmentedReply, Augmentor, SearchTurn, SEARCH_SENTINEL};
pub use error::ChatError;
pub use service::{ChatDefaults, ChatService, TurnOutcome, TurnRequest};
