//! Simple two-step analysis
//!
//! The lighter variant of the verification workflow: extract claims, verify
//! the top few directly against the model's own knowledge (no web research),
//! and generate questions. Unlike the four-stage pipeline this variant
//! propagates completion failures to the caller.

use crate::errors::AppError;
use crate::llm::CompletionClient;
use crate::parse::{parse_claims, parse_numbered_list};
use crate::pipeline::state::{Claim, ReportSummary, VerificationResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Verify at most this many claims per request
const MAX_VERIFIED_CLAIMS: usize = 3;

/// Bound on deck text embedded in the question prompt
const DECK_SUMMARY_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct SimpleAnalysis {
    pub claims: Vec<Claim>,
    pub verification_results: Vec<VerificationResult>,
    pub questions: Vec<String>,
    pub summary: ReportSummary,
}

pub struct AnalysisService {
    completion: Arc<dyn CompletionClient>,
}

impl AnalysisService {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    #[instrument(skip_all)]
    pub async fn analyze(&self, document_text: &str) -> Result<SimpleAnalysis, AppError> {
        // Step 1: extract claims (same prompt contract as the pipeline)
        let prefix: String = document_text.chars().take(3000).collect();
        let raw = self
            .completion
            .complete(&crate::pipeline::extraction_prompt(&prefix))
            .await?;
        let (_, claims) = parse_claims(&raw).into_value();

        // Step 2: verify the top claims directly, no external research
        let mut verification_results = Vec::new();
        for claim in claims.iter().take(MAX_VERIFIED_CLAIMS) {
            let verification_text = self
                .completion
                .complete(&direct_verification_prompt(&claim.text))
                .await?;
            verification_results.push(VerificationResult {
                claim: claim.text.clone(),
                verification_text,
                research_summary: String::new(),
            });
        }

        // Step 3: generate questions over deck text + verification summary
        let deck_summary: String = document_text.chars().take(DECK_SUMMARY_CHARS).collect();
        let raw = self
            .completion
            .complete(&summary_question_prompt(&deck_summary, &verification_results))
            .await?;
        let questions = parse_numbered_list(&raw).into_value();

        info!(
            claims = claims.len(),
            verified = verification_results.len(),
            questions = questions.len(),
            "Simple analysis complete"
        );

        let summary = ReportSummary {
            total_claims: claims.len(),
            verified_claims: verification_results.len(),
            questions_generated: questions.len(),
            degraded_stages: Vec::new(),
        };

        Ok(SimpleAnalysis {
            claims,
            verification_results,
            questions,
            summary,
        })
    }
}

fn direct_verification_prompt(claim: &str) -> String {
    format!(
        r#"You are a fact-checker for investor due diligence. Analyze this claim from a startup pitch deck:

Claim: "{claim}"

Provide:
1. Verification status (Verified/Partially Verified/Cannot Verify/Potentially Misleading)
2. Supporting evidence or reasoning
3. Red flags or concerns (if any)
4. Recommended verification steps

Be thorough but concise."#
    )
}

fn summary_question_prompt(deck_summary: &str, verifications: &[VerificationResult]) -> String {
    let verification_summary = verifications
        .iter()
        .map(|v| format!("- {}: {}", v.claim, v.verification_text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are helping an investor prepare for a meeting with a startup founder.

Based on the pitch deck and verification results below, generate 8-12 insightful questions
the investor should ask the founder. Focus on:
- Unverified or questionable claims
- Gaps in the pitch
- Critical assumptions
- Market and competitive positioning
- Business model sustainability
- Team capabilities

Pitch Deck Summary:
{deck_summary}

Verification Results:
{verification_summary}

Return as a numbered list."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedCompletion {
        responses: Mutex<VecDeque<Result<String, String>>>,
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted")
                .map_err(AppError::ModelUnavailable)
        }
    }

    fn scripted(responses: Vec<Result<&str, &str>>) -> AnalysisService {
        AnalysisService::new(Arc::new(ScriptedCompletion {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        }))
    }

    #[tokio::test]
    async fn test_simple_analysis_counts() {
        let service = scripted(vec![
            Ok(r#"{"company_name": "Acme", "claims": [
                {"claim": "a", "category": "market", "importance": "high"},
                {"claim": "b", "category": "revenue", "importance": "medium"}
            ]}"#),
            Ok("verdict a"),
            Ok("verdict b"),
            Ok("1. First question\n2. Second question"),
        ]);

        let analysis = service.analyze("deck text").await.unwrap();
        assert_eq!(analysis.summary.total_claims, 2);
        assert_eq!(analysis.summary.verified_claims, 2);
        assert_eq!(analysis.questions.len(), 2);
        assert_eq!(analysis.verification_results[0].verification_text, "verdict a");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let service = scripted(vec![Err("quota exceeded")]);
        let err = service.analyze("deck text").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }
}
