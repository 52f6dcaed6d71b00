//! Web search client
//!
//! DuckDuckGo has no free JSON API, so the production client scrapes the
//! HTML search interface and pulls out result snippets. The client is
//! stateless apart from its configuration and is safe to share across
//! in-flight requests.

use crate::config::SearchConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one web search and return the result snippets as a text block.
    async fn search(&self, query: &str) -> Result<String, AppError>;
}

/// DuckDuckGo HTML-scraping search client.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    config: SearchConfig,
}

impl DuckDuckGoSearch {
    pub fn new(config: SearchConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::SearchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Pull result snippets out of the DuckDuckGo results page.
    fn extract_snippets(&self, html: &str) -> Vec<String> {
        let mut snippets = Vec::new();

        // Result snippets live in elements carrying the result__snippet class
        for segment in html.split("result__snippet").skip(1) {
            if snippets.len() >= self.config.max_snippets {
                break;
            }

            let Some(tag_end) = segment.find('>') else {
                continue;
            };
            let Some(close) = segment[tag_end..].find("</a>").or_else(|| segment[tag_end..].find("</td>"))
            else {
                continue;
            };

            let text = strip_tags(&segment[tag_end + 1..tag_end + close]);
            let text = text.trim();
            if !text.is_empty() {
                snippets.push(text.to_string());
            }
        }

        snippets
    }
}

#[async_trait]
impl SearchClient for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<String, AppError> {
        debug!(query = %query, "Performing web search");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| AppError::SearchFailed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SearchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::SearchFailed(format!("body read failed: {}", e)))?;

        let snippets = self.extract_snippets(&body);
        if snippets.is_empty() {
            warn!(query = %query, "No search results found");
            return Ok(format!("No search results found for: {}", query));
        }

        debug!(query = %query, count = snippets.len(), "Search completed");
        Ok(snippets.join("\n"))
    }
}

/// Remove inline markup (e.g. <b> highlights) from a snippet.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_extract_snippets() {
        let search = DuckDuckGoSearch::new(AppConfig::default().search).unwrap();
        let html = r#"
            <a class="result__snippet" href="/x">Acme raised <b>$10M</b> in Series A funding.</a>
            <a class="result__snippet" href="/y">The SaaS market is growing at 18% CAGR.</a>
        "#;

        let snippets = search.extract_snippets(html);
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0], "Acme raised $10M in Series A funding.");
        assert_eq!(snippets[1], "The SaaS market is growing at 18% CAGR.");
    }

    #[test]
    fn test_snippet_cap() {
        let mut config = AppConfig::default().search;
        config.max_snippets = 1;
        let search = DuckDuckGoSearch::new(config).unwrap();

        let html = r#"
            <a class="result__snippet">first</a>
            <a class="result__snippet">second</a>
        "#;
        assert_eq!(search.extract_snippets(html), vec!["first".to_string()]);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("plain"), "plain");
        assert_eq!(strip_tags("a <b>bold</b> move"), "a bold move");
    }
}
