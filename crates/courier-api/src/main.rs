use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_api::{config::Config, router::build_router, state::AppState};
use courier_chat::{ChatDefaults, ChatService};
use courier_llm::{ModelRegistry, ProviderSet, RetryPolicy};
use courier_media::{Normalizer, TranscriberChain};
use courier_search::WebSearchClient;
use courier_store::ChatStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("starting Courier API server");
    tracing::info!("config loaded: {}:{}", config.server.host, config.server.port);

    let registry = Arc::new(ModelRegistry::builtin());

    let providers = Arc::new(ProviderSet::from_keys(
        config.siliconflow_api_key.as_deref(),
        config.groq_api_key.as_deref(),
        config.openai_api_key.as_deref(),
    )?);
    if !providers.has_chat(courier_llm::ProviderKind::SiliconFlow) {
        tracing::warn!("SILICONFLOW_API_KEY not set, siliconflow chat disabled");
    }
    if !providers.has_chat(courier_llm::ProviderKind::Groq) {
        tracing::warn!("GROQ_API_KEY not set, multimodal chat and fast transcription disabled");
    }

    let search = match config.bocha_api_key.as_deref() {
        Some(key) => Some(Arc::new(WebSearchClient::new(key)?)),
        None => {
            tracing::warn!("BOCHA_API_KEY not set, web search disabled");
            None
        }
    };

    tracing::info!("opening chat store");
    let store = Arc::new(ChatStore::open(&config.database.path).await?);

    let transcriber = Arc::new(TranscriberChain::new(providers.transcribers()));
    let normalizer = Arc::new(Normalizer::new((*transcriber).clone()));

    let policy = RetryPolicy {
        max_attempts: config.llm.max_attempts,
        attempt_timeout: Duration::from_secs(config.llm.attempt_timeout_secs),
        backoff: Duration::from_millis(config.llm.backoff_ms),
    };
    let defaults = ChatDefaults {
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
    };

    let mut chat = ChatService::new(
        registry.clone(),
        providers.clone(),
        normalizer,
        store.clone(),
    )
    .with_policy(policy)
    .with_defaults(defaults);
    if let Some(search) = &search {
        chat = chat.with_search(search.clone(), config.search.result_count);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        chat,
        store,
        registry,
        providers,
        search,
        transcriber,
    ));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server listening on {}", addr);
    tracing::info!("health check: http://{}/api/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
