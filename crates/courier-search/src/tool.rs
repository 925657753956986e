use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use courier_llm::{Tool, ToolCall};

use crate::dates::resolve_relative_dates;
use crate::provider::SearchProvider;

pub const WEB_SEARCH_TOOL: &str = "web_search";

const DEFAULT_RESULT_COUNT: u32 = 5;
const MAX_RESULT_COUNT: u32 = 20;

/// Tool card advertised to providers that support function calling.
pub fn web_search_tool() -> Tool {
    Tool::new(
        WEB_SEARCH_TOOL,
        "联网搜索最新信息。当问题涉及时效性内容（新闻、价格、天气、赛事结果等）时调用。",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "搜索关键词"
                },
                "count": {
                    "type": "integer",
                    "description": "返回结果数量，默认 5，最大 20"
                },
                "freshness": {
                    "type": "string",
                    "description": "时间范围，如 oneDay、oneWeek、oneMonth"
                }
            },
            "required": ["query"]
        }),
    )
}

#[derive(Debug, Deserialize)]
struct WebSearchArgs {
    query: String,

    #[serde(default)]
    count: Option<u32>,

    #[serde(default)]
    freshness: Option<String>,
}

/// Executes one `web_search` tool call and serializes the outcome for the
/// follow-up `role=tool` message. Failures are reported back to the model
/// rather than failing the turn.
pub async fn execute_web_search(
    search: &dyn SearchProvider,
    call: &ToolCall,
    today: NaiveDate,
) -> String {
    let args: WebSearchArgs = match call.parse_arguments() {
        Ok(args) => args,
        Err(error) => {
            return json!({
                "success": false,
                "error": format!("无法解析搜索参数: {error}"),
            })
            .to_string();
        }
    };

    let query = resolve_relative_dates(&args.query, today);
    let count = args.count.unwrap_or(DEFAULT_RESULT_COUNT).min(MAX_RESULT_COUNT);

    match search.search(&query, count, args.freshness.as_deref()).await {
        Ok(response) => json!({
            "success": true,
            "query": response.query,
            "total_count": response.total_count,
            "results": response.results,
        })
        .to_string(),
        Err(error) => json!({
            "success": false,
            "error": error.to_string(),
        })
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::provider::{SearchResponse, SearchResult};
    use async_trait::async_trait;
    use courier_llm::types::FunctionCall;
    use std::sync::Mutex;

    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for RecordingSearch {
        async fn search(
            &self,
            query: &str,
            _count: u32,
            _freshness: Option<&str>,
        ) -> Result<SearchResponse, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(SearchResponse {
                query: query.to_string(),
                results: vec![SearchResult {
                    title: "结果".to_string(),
                    url: "https://example.com".to_string(),
                    snippet: None,
                    summary: None,
                    site_name: None,
                    published_date: None,
                }],
                total_count: 1,
            })
        }
    }

    fn call(arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: WEB_SEARCH_TOOL.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn executes_search_with_resolved_dates() {
        let search = RecordingSearch {
            queries: Mutex::new(Vec::new()),
        };
        let today = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();

        let payload = execute_web_search(&search, &call(r#"{"query":"今天金价"}"#), today).await;

        assert_eq!(search.queries.lock().unwrap()[0], "2026年8月4日金价");
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["total_count"], 1);
    }

    #[tokio::test]
    async fn bad_arguments_are_reported_to_the_model() {
        let search = RecordingSearch {
            queries: Mutex::new(Vec::new()),
        };
        let today = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();

        let payload = execute_web_search(&search, &call("not-json"), today).await;

        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["success"], false);
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn tool_card_requires_query() {
        let tool = web_search_tool();
        assert_eq!(tool.function.name, WEB_SEARCH_TOOL);
        assert_eq!(tool.function.parameters["required"][0], "query");
    }
}
