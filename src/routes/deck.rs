use crate::errors::AppError;
use crate::pdf;
use crate::pipeline::state::AnalysisReport;
use crate::services::analysis::SimpleAnalysis;
use crate::services::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::{info, instrument};

/// Characters of extracted text returned in the upload preview
const PREVIEW_CHARS: usize = 500;

#[derive(Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub text_preview: String,
    pub word_count: usize,
    pub message: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub file_id: String,
    #[serde(flatten)]
    pub analysis: SimpleAnalysis,
}

#[derive(Serialize)]
pub struct AgentAnalyzeResponse {
    pub file_id: String,
    pub method: String,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

/// Upload a pitch deck PDF for analysis.
#[instrument(skip_all)]
pub async fn upload_pitch_deck(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFormat(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidFormat(format!("failed to read upload: {}", e)))?;
            upload = Some((filename, data));
            break;
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::ValidationError("Missing 'file' field".to_string()))?;

    // Reject before anything touches disk
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(AppError::ValidationError(
            "Only PDF files are allowed".to_string(),
        ));
    }

    let file_id = state.store.save(&data).await?;
    let path = state.store.resolve(&file_id.to_string()).await?;
    let text = pdf::extract_text_from(path).await?;
    let metadata = pdf::extract_metadata(&text);

    info!(
        file_id = %file_id,
        chars = metadata.length,
        words = metadata.word_count,
        "Pitch deck uploaded"
    );

    let text_preview = if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        text
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_id: file_id.to_string(),
            filename,
            text_preview,
            word_count: metadata.word_count,
            message: "Pitch deck uploaded successfully".to_string(),
        }),
    ))
}

/// Analyze a pitch deck with the direct two-step workflow (no web research).
#[instrument(skip(state))]
pub async fn analyze_pitch_deck(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let path = state.store.resolve(&file_id).await?;
    let text = pdf::extract_text_from(path).await?;

    let analysis = state.analysis.analyze(&text).await?;

    Ok(Json(AnalyzeResponse { file_id, analysis }))
}

/// Analyze a pitch deck with the full research-backed verification pipeline.
#[instrument(skip(state))]
pub async fn analyze_with_agents(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<AgentAnalyzeResponse>, AppError> {
    let path = state.store.resolve(&file_id).await?;
    let text = pdf::extract_text_from(path).await?;

    let report = state.pipeline.run(text).await;

    Ok(Json(AgentAnalyzeResponse {
        file_id,
        method: "multi_agent".to_string(),
        report,
    }))
}
