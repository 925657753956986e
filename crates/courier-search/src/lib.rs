pub mod client;
pub mod dates;
pub mod error;
pub mod format;
pub mod provider;
pub mod tool;

pub use client::WebSearchClient;
pub use dates::resolve_relative_dates;
pub use error::SearchError;
pub use format::format_results_block;
pub use provider::{SearchProvider, SearchResponse, SearchResult};
pub use tool::{execute_web_search, web_search_tool, WEB_SEARCH_TOOL};
