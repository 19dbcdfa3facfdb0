//! Google Search Tool
//!
//! Proxied web search when a credential is configured, deterministic mock
//! entries otherwise (or when the proxy fails).

use async_trait::async_trait;
use serde::Deserialize;

use agent_core::{
    error::{AgentError, Result},
    reasoning::markers,
    tool::{ToolCall, ToolHandler},
};

const MAX_RESULTS: usize = 3;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Tool for web search
pub struct GoogleSearchTool {
    http: reqwest::Client,
    search_url: String,
    credential: Option<String>,
}

impl GoogleSearchTool {
    pub fn new(search_url: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            search_url: search_url.into(),
            credential,
        }
    }

    async fn fetch(&self, query: &str, credential: &str) -> Result<Vec<SearchItem>> {
        let response = self
            .http
            .get(&self.search_url)
            .query(&[("q", query)])
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Http { status: status.as_u16(), body });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Format(format!("invalid search response: {e}")))?;
        Ok(parsed.items)
    }
}

#[async_trait]
impl ToolHandler for GoogleSearchTool {
    async fn execute(&self, call: &ToolCall) -> Result<String> {
        let query = call.str_arg("query")?;

        if let Some(credential) = &self.credential {
            match self.fetch(query, credential).await {
                Ok(items) if !items.is_empty() => return Ok(format_results(query, &items)),
                Ok(_) => tracing::debug!(%query, "Search returned no items, using mock results"),
                Err(e) => {
                    tracing::warn!(%query, error = %e, "Search proxy failed, using mock results");
                }
            }
        }

        Ok(mock_results(query))
    }
}

fn format_results(query: &str, items: &[SearchItem]) -> String {
    let mut output = format!("**{} for \"{query}\":**\n\n", markers::SEARCH_RESULTS);
    for item in items.iter().take(MAX_RESULTS) {
        output.push_str(&format!("- **{}**: {}\n", item.title, item.snippet));
    }
    output.trim_end().to_string()
}

fn mock_results(query: &str) -> String {
    let items = [
        SearchItem {
            title: format!("{query} - Overview"),
            snippet: format!(
                "An introduction to {query}, covering the key concepts and recent developments."
            ),
        },
        SearchItem {
            title: format!("Latest news on {query}"),
            snippet: format!("Recent updates and discussion about {query} from around the web."),
        },
        SearchItem {
            title: format!("{query}: guides and tutorials"),
            snippet: format!("Step-by-step resources for learning more about {query}."),
        },
    ];
    format_results(query, &items)
}
