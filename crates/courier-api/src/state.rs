use std::sync::Arc;

use courier_chat::ChatService;
use courier_llm::{ModelRegistry, ProviderSet};
use courier_media::TranscriberChain;
use courier_search::WebSearchClient;
use courier_store::ChatStore;

use crate::config::Config;

/// Shared application state passed to all handlers. Every collaborator is
/// constructed once at startup; nothing here is mutable after that.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<ChatService>,
    pub store: Arc<ChatStore>,
    pub registry: Arc<ModelRegistry>,
    pub providers: Arc<ProviderSet>,
    pub search: Option<Arc<WebSearchClient>>,
    pub transcriber: Arc<TranscriberChain>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        chat: ChatService,
        store: Arc<ChatStore>,
        registry: Arc<ModelRegistry>,
        providers: Arc<ProviderSet>,
        search: Option<Arc<WebSearchClient>>,
        transcriber: Arc<TranscriberChain>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            store,
            registry,
            providers,
            search,
            transcriber,
        }
    }
}
