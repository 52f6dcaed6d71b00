use crate::email::ReportMailer;
use crate::llm::CompletionClient;
use crate::pipeline::VerificationPipeline;
use crate::search::SearchClient;
use crate::services::analysis::AnalysisService;
use crate::storage::UploadStore;
use std::sync::Arc;

pub mod analysis;

// A container for all services to be injected into routes
#[derive(Clone)]
pub struct AppState {
    pub store: UploadStore,
    pub pipeline: Arc<VerificationPipeline>,
    pub analysis: Arc<AnalysisService>,
    pub mailer: Arc<dyn ReportMailer>,
}

impl AppState {
    pub fn new(
        store: UploadStore,
        completion: Arc<dyn CompletionClient>,
        search: Arc<dyn SearchClient>,
        mailer: Arc<dyn ReportMailer>,
    ) -> Self {
        Self {
            store,
            pipeline: Arc::new(VerificationPipeline::new(completion.clone(), search)),
            analysis: Arc::new(AnalysisService::new(completion)),
            mailer,
        }
    }
}
