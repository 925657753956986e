pub mod error;
pub mod providers;
pub mod registry;
pub mod resilient;
pub mod traits;
pub mod types;

pub use error::LlmError;
pub use providers::{GroqClient, OpenAIClient, ProviderKind, ProviderSet, SiliconFlowClient};
pub use registry::{ModelDescriptor, ModelRegistry, Selection};
pub use resilient::{resilient_chat, Completion, FallbackTarget, RetryPolicy};
pub use traits::{
    ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage, Transcript,
    TranscriptionClient, TranscriptionRequest,
};
pub use types::{Content, ContentPart, ImageUrl, Message, Tool, ToolCall, ToolChoice};
