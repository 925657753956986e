use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, warn};

use courier_llm::{
    resilient_chat, ChatClient, ChatRequest, Completion, FallbackTarget, Message, ProviderKind,
    RetryPolicy, ToolChoice,
};
use courier_search::{
    execute_web_search, format_results_block, resolve_relative_dates, SearchProvider,
    WEB_SEARCH_TOOL,
};

use crate::error::ChatError;

/// System prompt for the judgement pass of two-pass search mode. The model
/// either answers normally or replies with the sentinel plus a query.
const JUDGEMENT_PROMPT: &str = "你是一个智能助手。如果回答用户的问题需要联网获取最新信息（例如新闻、价格、天气、赛事结果等），请只回复 SEARCH_REQUIRED:<搜索关键词>，不要输出其他内容；否则请直接正常回答用户的问题。";

pub const SEARCH_SENTINEL: &str = "SEARCH_REQUIRED:";

/// Canned reply used when the model asked for a search but the search
/// backend failed; no second model call is made in that case.
const SEARCH_FAILED_REPLY: &str = "抱歉，联网搜索暂时不可用，无法获取最新信息。请稍后再试，或补充相关背景，我会尽力解答。";

const DEFAULT_RESULT_COUNT: u32 = 5;
const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// Two-pass controller states. `DirectAnswer`, `FinalAnswer` and
/// `FallbackMessage` are terminal.
#[derive(Debug)]
pub enum SearchTurn {
    AwaitingJudgement,
    DirectAnswer(Completion),
    SearchRequested(String),
    FinalAnswer { completion: Completion, query: String },
    FallbackMessage { reply: String, query: String },
}

/// Extracts the sentinel query from a judgement completion, if present.
pub fn parse_judgement(completion: &Completion) -> Option<String> {
    let text = completion.text.as_deref().unwrap_or("").trim();
    text.strip_prefix(SEARCH_SENTINEL)
        .map(|query| query.trim().to_string())
        .filter(|query| !query.is_empty())
}

/// Reply produced by either augmentation strategy (or a plain call),
/// annotated like every provider result.
#[derive(Debug, Clone)]
pub struct AugmentedReply {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub search_performed: bool,
}

impl AugmentedReply {
    pub fn from_completion(completion: Completion, search_performed: bool) -> Self {
        Self {
            text: completion.text.unwrap_or_default(),
            provider: completion.provider,
            model: completion.model,
            search_performed,
        }
    }
}

/// Search-augmentation controller. Owns the search backend seam and the
/// two strategies for reaching it.
pub struct Augmentor {
    search: Arc<dyn SearchProvider>,
    result_count: u32,
    max_tool_rounds: usize,
}

impl Augmentor {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            search,
            result_count: DEFAULT_RESULT_COUNT,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_result_count(mut self, result_count: u32) -> Self {
        self.result_count = result_count;
        self
    }

    /// Two-pass sentinel mode: judge, optionally search, answer. The
    /// judgement pass runs without cross-provider fallback; only the
    /// answering calls get one.
    pub async fn two_pass(
        &self,
        client: &dyn ChatClient,
        request: ChatRequest,
        policy: &RetryPolicy,
        fallback: Option<(&dyn ChatClient, &FallbackTarget)>,
        today: NaiveDate,
    ) -> Result<AugmentedReply, ChatError> {
        let mut state = SearchTurn::AwaitingJudgement;

        loop {
            state = match state {
                SearchTurn::AwaitingJudgement => {
                    let mut judgement_request = request.clone();
                    judgement_request
                        .messages
                        .insert(0, Message::system(JUDGEMENT_PROMPT));
                    let judgement =
                        resilient_chat(client, judgement_request, policy, None).await?;

                    match parse_judgement(&judgement) {
                        Some(query) => {
                            debug!(query = %query, "judgement requested a search");
                            SearchTurn::SearchRequested(query)
                        }
                        None => SearchTurn::DirectAnswer(judgement),
                    }
                }

                SearchTurn::SearchRequested(raw_query) => {
                    let query = resolve_relative_dates(&raw_query, today);
                    match self.search.search(&query, self.result_count, None).await {
                        Ok(results) => {
                            let mut final_request = request.clone();
                            final_request
                                .messages
                                .push(Message::system(format_results_block(&results)));
                            let completion =
                                resilient_chat(client, final_request, policy, fallback).await?;
                            SearchTurn::FinalAnswer { completion, query }
                        }
                        Err(error) => {
                            warn!(error = %error, query = %query, "web search failed");
                            SearchTurn::FallbackMessage {
                                reply: SEARCH_FAILED_REPLY.to_string(),
                                query,
                            }
                        }
                    }
                }

                SearchTurn::DirectAnswer(completion) => {
                    return Ok(AugmentedReply::from_completion(completion, false));
                }

                SearchTurn::FinalAnswer { completion, .. } => {
                    return Ok(AugmentedReply::from_completion(completion, true));
                }

                SearchTurn::FallbackMessage { reply, .. } => {
                    return Ok(AugmentedReply {
                        text: reply,
                        provider: client.provider(),
                        model: request.model.clone(),
                        search_performed: false,
                    });
                }
            };
        }
    }

    /// Explicit tool-calling mode: expose `web_search` on every call and
    /// execute whatever the model requests, appending each result as a
    /// `role=tool` message before the follow-up invocation.
    pub async fn tool_loop(
        &self,
        client: &dyn ChatClient,
        mut request: ChatRequest,
        policy: &RetryPolicy,
        fallback: Option<(&dyn ChatClient, &FallbackTarget)>,
        today: NaiveDate,
    ) -> Result<AugmentedReply, ChatError> {
        request.options.tools = Some(vec![courier_search::web_search_tool()]);
        request.options.tool_choice = Some(ToolChoice::auto());

        let mut search_performed = false;
        let mut completion = resilient_chat(client, request.clone(), policy, fallback).await?;

        let mut rounds = 0;
        while completion.requires_tool_execution() && rounds < self.max_tool_rounds {
            rounds += 1;
            let calls = completion.tool_calls.clone().unwrap_or_default();
            request.messages.push(Message::ai_with_tools(calls.clone()));

            for call in &calls {
                let payload = if call.function.name == WEB_SEARCH_TOOL {
                    search_performed = true;
                    execute_web_search(self.search.as_ref(), call, today).await
                } else {
                    warn!(tool = %call.function.name, "model requested an unknown tool");
                    json!({
                        "success": false,
                        "error": format!("未知工具: {}", call.function.name),
                    })
                    .to_string()
                };
                request
                    .messages
                    .push(Message::tool_result(call.id.clone(), payload));
            }

            completion = resilient_chat(client, request.clone(), policy, fallback).await?;
        }

        Ok(AugmentedReply::from_completion(completion, search_performed))
    }
}
