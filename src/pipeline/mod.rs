//! Claim verification pipeline
//!
//! Four stages run strictly in sequence: claim extraction, evidence
//! research, fact-check verification, and question generation. Each stage
//! consumes the previous `PipelineState` and returns an updated value, so
//! stage order is explicit and no stage aliases another's output.
//!
//! Every stage degrades and continues on upstream failure; the degraded
//! condition is recorded on the state and surfaced in the report summary.
//! A pipeline run therefore always produces a report.

pub mod state;

use crate::llm::CompletionClient;
use crate::parse::{parse_claims, parse_numbered_list, ParseOutcome};
use crate::research::{ResearchIntent, ResearchToolkit};
use crate::search::SearchClient;
use state::{
    AnalysisReport, Claim, Importance, PipelineState, ResearchResult, StageMarker,
    VerificationResult, UNKNOWN_COMPANY,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Bound on document text embedded in the extraction prompt
const DOCUMENT_PREFIX_CHARS: usize = 3000;

/// Research at most this many claims per run to bound external-call volume
const MAX_RESEARCHED_CLAIMS: usize = 3;

/// Bound on each stored research snippet
const SNIPPET_CHARS: usize = 1000;

/// Bound on the research summary copied into each verification result
const SUMMARY_CHARS: usize = 300;

/// Bound on each verification excerpt in the question prompt
const VERIFICATION_EXCERPT_CHARS: usize = 200;

pub struct VerificationPipeline {
    completion: Arc<dyn CompletionClient>,
    toolkit: ResearchToolkit,
}

impl VerificationPipeline {
    pub fn new(completion: Arc<dyn CompletionClient>, search: Arc<dyn SearchClient>) -> Self {
        Self {
            completion,
            toolkit: ResearchToolkit::new(search),
        }
    }

    /// Run the full pipeline over one document.
    #[instrument(skip(self, document_text), fields(doc_chars = document_text.len()))]
    pub async fn run(&self, document_text: String) -> AnalysisReport {
        let start = Instant::now();
        info!("Starting claim verification pipeline");

        let state = PipelineState::new(document_text);
        let state = self.extract_claims(state).await;
        let state = self.research_claims(state).await;
        let state = self.verify_claims(state).await;
        let state = self.generate_questions(state).await;

        metrics::counter!("deckcheck_pipeline_runs_total").increment(1);
        metrics::histogram!("deckcheck_pipeline_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        info!(
            company = %state.company_name,
            stage = state.stage.as_str(),
            claims = state.claims.len(),
            verified = state.verification_results.len(),
            questions = state.questions.len(),
            degraded = state.degraded.len(),
            total_ms = start.elapsed().as_millis(),
            "Pipeline complete"
        );

        state.into_report()
    }

    /// Stage 1: extract verifiable claims and the company name.
    #[instrument(skip_all)]
    async fn extract_claims(&self, state: PipelineState) -> PipelineState {
        let prefix: String = state
            .document_text
            .chars()
            .take(DOCUMENT_PREFIX_CHARS)
            .collect();
        let prompt = extraction_prompt(&prefix);

        let raw = match self.completion.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Claim extraction model call failed");
                let mut degraded = state.degraded;
                degraded.push(format!("extraction: model call failed: {}", e));
                return PipelineState {
                    company_name: UNKNOWN_COMPANY.to_string(),
                    claims: Vec::new(),
                    stage: StageMarker::ClaimsExtractionFailed,
                    degraded,
                    ..state
                };
            }
        };

        let mut degraded = state.degraded;
        let (company_name, claims) = match parse_claims(&raw) {
            ParseOutcome::Parsed(value) => value,
            ParseOutcome::Fallback { value, reason } => {
                warn!(reason = %reason, "Claim extraction output unparseable");
                degraded.push(format!("extraction: {}", reason));
                value
            }
        };

        info!(company = %company_name, claims = claims.len(), "Claims extracted");
        metrics::counter!("deckcheck_claims_extracted_total").increment(claims.len() as u64);

        PipelineState {
            company_name,
            claims,
            stage: StageMarker::ClaimsExtracted,
            degraded,
            ..state
        }
    }

    /// Stage 2: research the top high-importance claims.
    #[instrument(skip_all)]
    async fn research_claims(&self, state: PipelineState) -> PipelineState {
        let targets: Vec<Claim> = state
            .claims
            .iter()
            .filter(|c| c.importance == Importance::High && c.needs_verification)
            .take(MAX_RESEARCHED_CLAIMS)
            .cloned()
            .collect();

        let mut research_results = Vec::with_capacity(targets.len());
        for claim in &targets {
            let intent = ResearchIntent::for_category(claim.category);
            debug!(claim = %claim.text, category = claim.category.as_str(), "Researching claim");
            let snippet = self
                .toolkit
                .research(intent, &claim.text, &state.company_name)
                .await;

            research_results.push(ResearchResult {
                claim: claim.text.clone(),
                category: claim.category,
                research_snippet: truncate_chars(&snippet, SNIPPET_CHARS),
            });
        }

        info!(researched = research_results.len(), "Research complete");

        PipelineState {
            research_results,
            stage: StageMarker::ResearchComplete,
            ..state
        }
    }

    /// Stage 3: fact-check each researched claim against its evidence.
    #[instrument(skip_all)]
    async fn verify_claims(&self, state: PipelineState) -> PipelineState {
        let mut verification_results = Vec::with_capacity(state.research_results.len());
        let mut degraded = state.degraded;

        for research in &state.research_results {
            let prompt = verification_prompt(&research.claim, &research.research_snippet);

            let verification_text = match self.completion.complete(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(claim = %research.claim, error = %e, "Verification model call failed");
                    degraded.push(format!("verification: model call failed: {}", e));
                    format!("Verification unavailable: {}", e)
                }
            };

            verification_results.push(VerificationResult {
                claim: research.claim.clone(),
                verification_text,
                research_summary: truncate_chars(&research.research_snippet, SUMMARY_CHARS),
            });
        }

        info!(verified = verification_results.len(), "Verification complete");
        metrics::counter!("deckcheck_claims_verified_total")
            .increment(verification_results.len() as u64);

        PipelineState {
            verification_results,
            stage: StageMarker::VerificationComplete,
            degraded,
            ..state
        }
    }

    /// Stage 4: generate investor questions from the verification summaries.
    /// Issues one completion call even when nothing was verified.
    #[instrument(skip_all)]
    async fn generate_questions(&self, state: PipelineState) -> PipelineState {
        let verification_summary = state
            .verification_results
            .iter()
            .map(|v| {
                format!(
                    "Claim: {}\nVerification: {}...",
                    v.claim,
                    truncate_chars(&v.verification_text, VERIFICATION_EXCERPT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = question_prompt(&state.company_name, &verification_summary);
        let mut degraded = state.degraded;

        let questions = match self.completion.complete(&prompt).await {
            Ok(raw) => match parse_numbered_list(&raw) {
                ParseOutcome::Parsed(questions) => questions,
                ParseOutcome::Fallback { value, reason } => {
                    warn!(reason = %reason, "Question output not a numbered list");
                    degraded.push(format!("question_generation: {}", reason));
                    value
                }
            },
            Err(e) => {
                warn!(error = %e, "Question generation model call failed");
                degraded.push(format!("question_generation: model call failed: {}", e));
                Vec::new()
            }
        };

        info!(questions = questions.len(), "Questions generated");
        metrics::counter!("deckcheck_questions_generated_total").increment(questions.len() as u64);

        PipelineState {
            questions,
            stage: StageMarker::Complete,
            degraded,
            ..state
        }
    }
}

/// Truncate to at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub(crate) fn extraction_prompt(document_prefix: &str) -> String {
    format!(
        r#"You are a senior investment analyst. Analyze this pitch deck and extract ALL verifiable claims.

Focus on:
1. Market size and growth claims (TAM, SAM, SOM, CAGR)
2. Company metrics (revenue, users, growth rate, MRR, ARR)
3. Technology performance claims (speed, accuracy, efficiency)
4. Team credentials (previous companies, roles, years of experience)
5. Competitive advantages and differentiators
6. Customer/traction metrics

Pitch Deck:
{document_prefix}

Also identify the company name if mentioned.

Return a JSON object with:
{{
    "company_name": "company name or 'Unknown'",
    "claims": [
        {{
            "claim": "exact claim text",
            "category": "market|revenue|technology|team|competitive|traction",
            "importance": "high|medium|low",
            "needs_verification": true|false
        }}
    ]
}}

Return ONLY valid JSON, no other text."#
    )
}

fn verification_prompt(claim: &str, research_snippet: &str) -> String {
    format!(
        r#"You are a fact-checker for investor due diligence.

Claim to verify: "{claim}"

Research data found:
{research_snippet}

Provide:
1. Verification Status: [Verified / Partially Verified / Cannot Verify / Red Flag]
2. Evidence: What supports or contradicts this claim?
3. Confidence Level: [High / Medium / Low]
4. Red Flags: Any concerns or inconsistencies?
5. Next Steps: How should the investor verify this further?

Be thorough but concise. Focus on facts."#
    )
}

fn question_prompt(company_name: &str, verification_summary: &str) -> String {
    format!(
        r#"You are helping an investor prepare for a meeting with the {company_name} founder.

Based on the verification results below, generate 10-12 specific, insightful questions.

Focus on:
- Unverified or questionable claims
- Red flags or inconsistencies
- Missing information or gaps
- Critical assumptions that need validation
- Market positioning and competitive dynamics

Verification Summary:
{verification_summary}

Generate questions that:
1. Show you've done your homework
2. Get to the heart of the business model
3. Reveal risks and assumptions
4. Help assess founder credibility

Return as a numbered list (1., 2., 3., etc.)"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Completion client that replays a fixed script of responses.
    struct ScriptedCompletion {
        responses: Mutex<VecDeque<Result<String, String>>>,
    }

    impl ScriptedCompletion {
        fn new(responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
            }
        }
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

    /// Search client that records queries and returns a fixed snippet.
    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
        snippet: String,
    }

    impl RecordingSearch {
        fn new(snippet: &str) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                snippet: snippet.to_string(),
            }
        }
    }

    #[async_trait]
    impl crate::search::SearchClient for RecordingSearch {
        async fn search(&self, query: &str) -> Result<String, AppError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.snippet.clone())
        }
    }

    const EXTRACTION_JSON: &str = r#"{
        "company_name": "Acme",
        "claims": [
            {"claim": "We have 10,000 paying customers", "category": "traction", "importance": "high", "needs_verification": true}
        ]
    }"#;

    #[tokio::test]
    async fn test_traction_claim_routes_to_company_search() {
        let search = Arc::new(RecordingSearch::new("Acme has raised $2M to date"));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(EXTRACTION_JSON),
            Ok("Verification Status: Cannot Verify. No public customer counts found."),
            Ok("1. How many of the 10,000 customers are on paid plans?\n2. What is your churn?"),
        ]));

        let pipeline = VerificationPipeline::new(completion, search.clone());
        let report = pipeline.run("Acme deck text".to_string()).await;

        // Company-funding search keyed on the company name
        let queries = search.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], "Acme funding crunchbase startup");
        drop(queries);

        assert_eq!(report.company_name, "Acme");
        assert_eq!(report.summary.total_claims, 1);
        assert_eq!(report.summary.verified_claims, 1);
        assert_eq!(report.verification_results.len(), 1);
        assert!(report.verification_results[0]
            .research_summary
            .contains("Acme has raised $2M"));
        assert!(report.summary.questions_generated >= 1);
        assert!(report.questions[0].contains("10,000 customers"));
        assert!(report.summary.degraded_stages.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_still_yields_questions() {
        let search = Arc::new(RecordingSearch::new("unused"));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err("quota exceeded"),
            // Stage 4 still runs over the empty verification summary
            Ok("1. What traction can you demonstrate?"),
        ]));

        let pipeline = VerificationPipeline::new(completion, search.clone());
        let report = pipeline.run("deck".to_string()).await;

        assert_eq!(report.company_name, "Unknown");
        assert_eq!(report.summary.total_claims, 0);
        assert_eq!(report.summary.verified_claims, 0);
        assert!(search.queries.lock().unwrap().is_empty());
        assert!(report.summary.questions_generated >= 1);
        assert!(report
            .summary
            .degraded_stages
            .iter()
            .any(|d| d.starts_with("extraction:")));
    }

    #[tokio::test]
    async fn test_research_capped_at_three_high_importance_claims() {
        let claims: Vec<String> = (1..=5)
            .map(|i| {
                format!(
                    r#"{{"claim": "claim {i}", "category": "market", "importance": "high", "needs_verification": true}}"#
                )
            })
            .collect();
        let extraction = format!(
            r#"{{"company_name": "Acme", "claims": [{}]}}"#,
            claims.join(",")
        );

        let search = Arc::new(RecordingSearch::new("evidence"));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(extraction.as_str()),
            Ok("verdict 1"),
            Ok("verdict 2"),
            Ok("verdict 3"),
            Ok("1. question"),
        ]));

        let pipeline = VerificationPipeline::new(completion, search.clone());
        let report = pipeline.run("deck".to_string()).await;

        assert_eq!(report.summary.total_claims, 5);
        assert_eq!(report.summary.verified_claims, 3);
        assert_eq!(search.queries.lock().unwrap().len(), 3);
        // Verification order matches research order matches claim order
        assert_eq!(report.verification_results[0].claim, "claim 1");
        assert_eq!(report.verification_results[2].claim, "claim 3");
    }

    #[tokio::test]
    async fn test_low_importance_and_opted_out_claims_not_researched() {
        let extraction = r#"{"company_name": "Acme", "claims": [
            {"claim": "a", "category": "market", "importance": "low", "needs_verification": true},
            {"claim": "b", "category": "market", "importance": "high", "needs_verification": false},
            {"claim": "c", "category": "general", "importance": "high", "needs_verification": true}
        ]}"#;

        let search = Arc::new(RecordingSearch::new("evidence"));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(extraction),
            Ok("verdict"),
            Ok("1. question"),
        ]));

        let pipeline = VerificationPipeline::new(completion, search.clone());
        let report = pipeline.run("deck".to_string()).await;

        assert_eq!(report.summary.verified_claims, 1);
        assert_eq!(report.verification_results[0].claim, "c");
        // General category falls through to plain web search
        assert_eq!(search.queries.lock().unwrap()[0], "c");
    }

    #[tokio::test]
    async fn test_verification_failure_degrades_without_aborting() {
        let search = Arc::new(RecordingSearch::new("evidence"));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(EXTRACTION_JSON),
            Err("model overloaded"),
            Ok("1. question"),
        ]));

        let pipeline = VerificationPipeline::new(completion, search);
        let report = pipeline.run("deck".to_string()).await;

        assert_eq!(report.summary.verified_claims, 1);
        assert!(report.verification_results[0]
            .verification_text
            .starts_with("Verification unavailable:"));
        assert!(report
            .summary
            .degraded_stages
            .iter()
            .any(|d| d.starts_with("verification:")));
        assert!(report.summary.questions_generated >= 1);
    }

    #[tokio::test]
    async fn test_unnumbered_question_output_falls_back_to_raw_text() {
        let search = Arc::new(RecordingSearch::new("evidence"));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(EXTRACTION_JSON),
            Ok("verdict"),
            Ok("Ask the founder about customer counts."),
        ]));

        let pipeline = VerificationPipeline::new(completion, search);
        let report = pipeline.run("deck".to_string()).await;

        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0], "Ask the founder about customer counts.");
        assert!(report
            .summary
            .degraded_stages
            .iter()
            .any(|d| d.starts_with("question_generation:")));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
    }

    #[test]
    fn test_prompts_embed_inputs() {
        let p = extraction_prompt("DECK TEXT");
        assert!(p.contains("DECK TEXT"));
        assert!(p.contains("Return ONLY valid JSON"));

        let p = verification_prompt("the claim", "the evidence");
        assert!(p.contains("\"the claim\""));
        assert!(p.contains("the evidence"));

        let p = question_prompt("Acme", "summary here");
        assert!(p.contains("Acme founder"));
        assert!(p.contains("summary here"));
    }
}
