//! Deckcheck
//!
//! Pitch-deck claim verification service. Accepts uploaded decks (HTTP or
//! inbound email), extracts claims with a completion model, researches them
//! on the web, verifies them, and generates due-diligence questions.

mod config;
mod email;
mod errors;
mod llm;
mod metrics;
mod parse;
mod pdf;
mod pipeline;
mod research;
mod routes;
mod search;
mod services;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = config::AppConfig::load()?;

    // 2. Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    tracing::info!("Starting Deckcheck v{}", env!("CARGO_PKG_VERSION"));

    // 3. Initialize metrics
    let metrics_handle = metrics::setup_recorder()?;
    metrics::register_metrics();

    // 4. Initialize upload storage
    let store = storage::UploadStore::open(&config.storage.upload_dir).await?;

    // 5. Initialize completion client
    // MockCompletion when no API key is configured (or it is "mock"),
    // else the Gemini-backed client
    let completion: Arc<dyn llm::CompletionClient> = match config.llm.api_key.as_deref() {
        None | Some("") | Some("mock") => {
            tracing::warn!("No completion API key configured, using mock responses");
            Arc::new(llm::MockCompletion::new())
        }
        Some(_) => Arc::new(llm::GeminiCompletion::new(config.llm.clone())?),
    };

    // 6. Initialize web search
    let search: Arc<dyn search::SearchClient> =
        Arc::new(search::DuckDuckGoSearch::new(config.search.clone())?);

    // 7. Initialize outbound email
    let mailer: Arc<dyn email::ReportMailer> =
        if config.smtp.from_address.is_some() && config.smtp.password.is_some() {
            Arc::new(email::SmtpMailer::new(&config.smtp)?)
        } else {
            tracing::warn!("No SMTP credentials configured, report emails disabled");
            Arc::new(email::DisabledMailer)
        };

    // 8. Initialize App State (Services)
    let state = services::AppState::new(store, completion, search, mailer);

    // 9. Setup Router
    let app = routes::create_router(state, &config, metrics_handle);

    // 10. Start Server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
