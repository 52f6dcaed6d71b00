//! Completion model clients
//!
//! `CompletionClient` is the seam between the pipeline and the hosted
//! text-generation model: one prompt string in, one completion string out.
//! No retries and no response caching; every call consumes upstream quota.

use crate::config::LlmConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

// Gemini generateContent wire types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiCompletion {
    client: reqwest::Client,
    config: LlmConfig,
}

impl GeminiCompletion {
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::ModelUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionClient for GeminiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ModelUnavailable("no API key configured".to_string()))?;

        let url = format!(
            "{}/{}:generateContent",
            self.config.api_base, self.config.model
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModelUnavailable(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("malformed response: {}", e)))?;

        let text: String = body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AppError::ModelUnavailable(
                "empty completion from model".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Offline completion client for development and tests. Picks a plausible
/// canned response by inspecting the prompt.
pub struct MockCompletion;

impl MockCompletion {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        if prompt.contains("extract ALL verifiable claims") {
            return Ok(r#"{
                "company_name": "MockCo",
                "claims": [
                    {"claim": "We have 1,000 paying customers", "category": "traction", "importance": "high", "needs_verification": true}
                ]
            }"#
            .to_string());
        }

        if prompt.contains("fact-checker") {
            return Ok("1. Verification Status: Cannot Verify\n\
                       2. Evidence: No independent sources located. [Mock response]\n\
                       3. Confidence Level: Low\n\
                       4. Red Flags: None identified\n\
                       5. Next Steps: Request customer references"
                .to_string());
        }

        Ok("1. How many of your customers are on paid plans today?\n\
            2. What does month-over-month retention look like?\n\
            3. Which competitor do you lose deals to most often? [Mock response]"
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_completion_shapes() {
        let mock = MockCompletion::new();

        let extraction = mock
            .complete("... extract ALL verifiable claims ...")
            .await
            .unwrap();
        assert!(extraction.contains("company_name"));

        let questions = mock.complete("generate questions").await.unwrap();
        assert!(questions.starts_with("1."));
    }

    #[test]
    fn test_gemini_response_deserialization() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "hello"}, {"text": " world"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "hello world");
    }
}
