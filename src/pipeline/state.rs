//! Pipeline state and report models
//!
//! One `PipelineState` is created per analysis request, moves through the
//! four stages by value, and is projected into an `AnalysisReport` at the
//! end. Stages never mutate a prior stage's output list.

use serde::{Deserialize, Serialize};

/// Sentinel used until extraction identifies the company.
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Category assigned to an extracted claim by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimCategory {
    Market,
    Revenue,
    Technology,
    Team,
    Competitive,
    Traction,
    #[serde(other)]
    General,
}

impl ClaimCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Revenue => "revenue",
            Self::Technology => "technology",
            Self::Team => "team",
            Self::Competitive => "competitive",
            Self::Traction => "traction",
            Self::General => "general",
        }
    }
}

/// Importance assigned to an extracted claim by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Low,
    #[default]
    #[serde(other)]
    Medium,
}

/// A single verifiable statement extracted from a pitch deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Exact claim text
    #[serde(rename = "claim")]
    pub text: String,

    /// Claim category, drives research tool selection
    #[serde(default = "default_category")]
    pub category: ClaimCategory,

    #[serde(default)]
    pub importance: Importance,

    /// Whether the claim is worth verifying; absent means yes
    #[serde(default = "default_true")]
    pub needs_verification: bool,
}

fn default_category() -> ClaimCategory {
    ClaimCategory::General
}

fn default_true() -> bool {
    true
}

/// Evidence gathered for one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub claim: String,
    pub category: ClaimCategory,
    /// Raw search text, truncated to bound prompt size
    pub research_snippet: String,
}

/// Assessment of one claim against its research snippet. 1:1 with
/// `ResearchResult`, same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub claim: String,
    pub verification_text: String,
    pub research_summary: String,
}

/// Observability marker for pipeline progress. Advances monotonically;
/// never used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMarker {
    Initialized,
    ClaimsExtracted,
    ClaimsExtractionFailed,
    ResearchComplete,
    VerificationComplete,
    Complete,
}

impl StageMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::ClaimsExtracted => "claims_extracted",
            Self::ClaimsExtractionFailed => "claims_extraction_failed",
            Self::ResearchComplete => "research_complete",
            Self::VerificationComplete => "verification_complete",
            Self::Complete => "complete",
        }
    }
}

/// State threaded through the four pipeline stages. Each stage consumes the
/// previous state and returns an updated value; fields are written once by
/// their owning stage.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub document_text: String,
    pub company_name: String,
    pub claims: Vec<Claim>,
    pub research_results: Vec<ResearchResult>,
    pub verification_results: Vec<VerificationResult>,
    pub questions: Vec<String>,
    pub stage: StageMarker,
    /// Degraded-stage notes, surfaced in the report summary
    pub degraded: Vec<String>,
}

impl PipelineState {
    pub fn new(document_text: String) -> Self {
        Self {
            document_text,
            company_name: UNKNOWN_COMPANY.to_string(),
            claims: Vec::new(),
            research_results: Vec::new(),
            verification_results: Vec::new(),
            questions: Vec::new(),
            stage: StageMarker::Initialized,
            degraded: Vec::new(),
        }
    }

    /// Project the terminal state into the response report.
    pub fn into_report(self) -> AnalysisReport {
        let summary = ReportSummary {
            total_claims: self.claims.len(),
            verified_claims: self.verification_results.len(),
            questions_generated: self.questions.len(),
            degraded_stages: self.degraded,
        };

        AnalysisReport {
            company_name: self.company_name,
            claims: self.claims,
            verification_results: self.verification_results,
            questions: self.questions,
            summary,
        }
    }
}

/// Counts reported alongside the analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_claims: usize,
    pub verified_claims: usize,
    pub questions_generated: usize,
    /// Stages that completed in degraded mode, empty on a clean run
    #[serde(default)]
    pub degraded_stages: Vec<String>,
}

/// Final pipeline output returned over HTTP and formatted into email reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub company_name: String,
    pub claims: Vec<Claim>,
    pub verification_results: Vec<VerificationResult>,
    pub questions: Vec<String>,
    pub summary: ReportSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_deserialization_defaults() {
        let claim: Claim = serde_json::from_str(
            r#"{"claim": "We have 10,000 paying customers", "category": "traction", "importance": "high"}"#,
        )
        .unwrap();

        assert_eq!(claim.category, ClaimCategory::Traction);
        assert_eq!(claim.importance, Importance::High);
        assert!(claim.needs_verification);
    }

    #[test]
    fn test_unknown_category_falls_back_to_general() {
        let claim: Claim = serde_json::from_str(
            r#"{"claim": "x", "category": "financials", "importance": "low"}"#,
        )
        .unwrap();

        assert_eq!(claim.category, ClaimCategory::General);
    }

    #[test]
    fn test_report_projection() {
        let mut state = PipelineState::new("deck text".to_string());
        state.claims.push(Claim {
            text: "claim".to_string(),
            category: ClaimCategory::Market,
            importance: Importance::High,
            needs_verification: true,
        });
        state.questions.push("Q1?".to_string());

        let report = state.into_report();
        assert_eq!(report.summary.total_claims, 1);
        assert_eq!(report.summary.verified_claims, 0);
        assert_eq!(report.summary.questions_generated, 1);
        assert!(report.summary.degraded_stages.is_empty());
    }
}
