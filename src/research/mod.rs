//! Claim research tool set
//!
//! Each research intent fills a query template for one kind of evidence and
//! labels the raw search text it gets back. Tool failures are downgraded to
//! descriptive evidence strings: a degraded snippet is preferable to
//! aborting verification, so nothing in this module raises to its caller.

use crate::pipeline::state::ClaimCategory;
use crate::search::SearchClient;
use std::sync::Arc;
use tracing::{debug, instrument};

/// What kind of evidence to look for when researching a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchIntent {
    WebSearch,
    CompanyFunding,
    MarketSize,
    PersonBackground,
    TechnologyBenchmark,
    CompetitorAnalysis,
}

impl ResearchIntent {
    /// Category → intent lookup. Kept declarative so the dispatch rule is
    /// testable apart from the orchestration.
    pub fn for_category(category: ClaimCategory) -> Self {
        match category {
            ClaimCategory::Market => Self::MarketSize,
            ClaimCategory::Team => Self::PersonBackground,
            ClaimCategory::Technology => Self::TechnologyBenchmark,
            ClaimCategory::Competitive => Self::CompetitorAnalysis,
            ClaimCategory::Revenue | ClaimCategory::Traction => Self::CompanyFunding,
            ClaimCategory::General => Self::WebSearch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::CompanyFunding => "company_funding",
            Self::MarketSize => "market_size",
            Self::PersonBackground => "person_background",
            Self::TechnologyBenchmark => "technology_benchmark",
            Self::CompetitorAnalysis => "competitor_analysis",
        }
    }

    /// Fill the intent's query template. Company-funding searches key on the
    /// company rather than the claim text.
    fn build_query(&self, claim: &str, company: &str) -> String {
        match self {
            Self::WebSearch => claim.to_string(),
            Self::CompanyFunding => format!("{} funding crunchbase startup", company),
            Self::MarketSize => {
                format!("{} market size TAM SAM statistics gartner statista", claim)
            }
            Self::PersonBackground => {
                format!("{} {} linkedin background experience", claim, company)
            }
            Self::TechnologyBenchmark => {
                format!("{} benchmark industry standard performance", claim)
            }
            Self::CompetitorAnalysis => format!("{} revenue funding market share", claim),
        }
    }

    /// Label prefixed to the raw search text.
    fn label(&self, claim: &str, company: &str) -> String {
        match self {
            Self::WebSearch => format!("Web search results for \"{}\":", claim),
            Self::CompanyFunding => format!("Company information for {}:", company),
            Self::MarketSize => "Market data:".to_string(),
            Self::PersonBackground => "Person background:".to_string(),
            Self::TechnologyBenchmark => "Technology benchmarks:".to_string(),
            Self::CompetitorAnalysis => "Competitor analysis:".to_string(),
        }
    }
}

/// Research tool set shared by all pipeline runs.
pub struct ResearchToolkit {
    search: Arc<dyn SearchClient>,
}

impl ResearchToolkit {
    pub fn new(search: Arc<dyn SearchClient>) -> Self {
        Self { search }
    }

    /// Gather evidence for one claim. Never fails: search errors come back
    /// as descriptive strings in place of evidence.
    #[instrument(skip(self, claim, company), fields(intent = intent.as_str()))]
    pub async fn research(&self, intent: ResearchIntent, claim: &str, company: &str) -> String {
        let query = intent.build_query(claim, company);
        debug!(query = %query, "Researching claim");

        match self.search.search(&query).await {
            Ok(text) => format!("{}\n{}", intent.label(claim, company), text),
            Err(e) => format!("{} search failed: {}", intent.as_str(), e),
        }
    }
}
