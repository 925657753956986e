use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::error::SearchError;
use crate::provider::{SearchProvider, SearchResponse, SearchResult};

const BOCHA_API_BASE: &str = "https://api.bochaai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Bocha web-search client.
pub struct WebSearchClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl WebSearchClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| SearchError::Unconfigured)?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SearchError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: BOCHA_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for WebSearchClient {
    async fn search(
        &self,
        query: &str,
        count: u32,
        freshness: Option<&str>,
    ) -> Result<SearchResponse, SearchError> {
        debug!(query = %query, count, "performing web search");

        let mut body = serde_json::json!({
            "query": query,
            "count": count,
            "summary": true,
        });
        if let Some(freshness) = freshness {
            body.as_object_mut()
                .unwrap()
                .insert("freshness".to_string(), serde_json::json!(freshness));
        }

        let response = self
            .http_client
            .post(format!("{}/web-search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(SearchError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, message });
        }

        let raw: BochaResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let pages = raw
            .data
            .and_then(|data| data.web_pages)
            .unwrap_or_default();
        let results: Vec<SearchResult> = pages
            .value
            .into_iter()
            .map(|page| SearchResult {
                title: page.name,
                url: page.url,
                snippet: page.snippet,
                summary: page.summary,
                site_name: page.site_name,
                published_date: page.date_published,
            })
            .collect();

        debug!(result_count = results.len(), "web search completed");

        Ok(SearchResponse {
            query: query.to_string(),
            total_count: pages.total_estimated_matches.unwrap_or(results.len()),
            results,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BochaResponse {
    data: Option<BochaData>,
}

#[derive(Debug, Deserialize)]
struct BochaData {
    #[serde(rename = "webPages")]
    web_pages: Option<BochaWebPages>,
}

#[derive(Debug, Default, Deserialize)]
struct BochaWebPages {
    #[serde(default)]
    value: Vec<BochaPage>,

    #[serde(rename = "totalEstimatedMatches")]
    total_estimated_matches: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct BochaPage {
    name: String,
    url: String,
    snippet: Option<String>,
    summary: Option<String>,

    #[serde(rename = "siteName")]
    site_name: Option<String>,

    #[serde(rename = "datePublished")]
    date_published: Option<String>,
}
