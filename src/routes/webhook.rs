//! Inbound email webhook
//!
//! Receives forwarded emails (multipart form posts from the mail provider),
//! pulls the first PDF attachment, runs the verification pipeline, and mails
//! the report back to the sender.

use crate::errors::AppError;
use crate::pdf;
use crate::services::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

#[instrument(skip_all)]
pub async fn email_webhook(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<WebhookResponse>, AppError> {
    let mut sender = None;
    let mut subject = None;
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFormat(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("sender") => {
                sender = Some(field.text().await.map_err(|e| {
                    AppError::InvalidFormat(format!("failed to read sender: {}", e))
                })?);
            }
            Some("subject") => {
                subject = Some(field.text().await.map_err(|e| {
                    AppError::InvalidFormat(format!("failed to read subject: {}", e))
                })?);
            }
            _ => {
                // First PDF attachment wins, whatever the provider names it
                let is_pdf = field
                    .file_name()
                    .map(|f| f.to_ascii_lowercase().ends_with(".pdf"))
                    .unwrap_or(false);
                if is_pdf && attachment.is_none() {
                    attachment = Some(field.bytes().await.map_err(|e| {
                        AppError::InvalidFormat(format!("failed to read attachment: {}", e))
                    })?);
                }
            }
        }
    }

    let sender =
        sender.ok_or_else(|| AppError::ValidationError("Missing 'sender' field".to_string()))?;
    let subject =
        subject.ok_or_else(|| AppError::ValidationError("Missing 'subject' field".to_string()))?;
    let attachment = attachment
        .ok_or_else(|| AppError::ValidationError("No PDF attachment found".to_string()))?;

    info!(
        sender = %sender,
        subject = %subject,
        bytes = attachment.len(),
        "Received pitch deck over email"
    );

    let file_id = state.store.save(&attachment).await?;
    let path = state.store.resolve(&file_id.to_string()).await?;
    let text = pdf::extract_text_from(path).await?;

    let report = state.pipeline.run(text).await;

    if !state.mailer.send_report(&sender, &report).await {
        return Err(AppError::EmailDeliveryFailed(format!(
            "failed to deliver report to {}",
            sender
        )));
    }

    Ok(Json(WebhookResponse {
        status: "success".to_string(),
        message: format!("Analysis sent to {}", sender),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::DisabledMailer;
    use crate::llm::CompletionClient;
    use crate::search::SearchClient;
    use crate::storage::UploadStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct CountingCompletion {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for CountingCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("1. question".to_string())
        }
    }

    struct NoopSearch;

    #[async_trait]
    impl SearchClient for NoopSearch {
        async fn search(&self, _query: &str) -> Result<String, AppError> {
            Ok("evidence".to_string())
        }
    }

    async fn test_app(dir: &Path) -> (Router, Arc<CountingCompletion>) {
        let store = UploadStore::open(dir).await.unwrap();
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
        });
        let state = crate::services::AppState::new(
            store,
            completion.clone(),
            Arc::new(NoopSearch),
            Arc::new(DisabledMailer),
        );
        let app = Router::new()
            .route("/api/email/webhook", post(email_webhook))
            .with_state(state);
        (app, completion)
    }

    const BOUNDARY: &str = "deckcheck-test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
             {value}\r\n"
        )
    }

    fn pdf_part() -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"attachment-1\"; filename=\"deck.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4 fake\r\n"
        )
    }

    fn webhook_request(parts: &[String]) -> Request<Body> {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        Request::builder()
            .method("POST")
            .uri("/api/email/webhook")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_subject_is_rejected_before_analysis() {
        let dir = std::env::temp_dir().join(format!("deckcheck-test-{}", Uuid::new_v4()));
        let (app, completion) = test_app(&dir).await;

        let request = webhook_request(&[
            text_part("sender", "founder@example.com"),
            pdf_part(),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_pdf_attachment_is_rejected() {
        let dir = std::env::temp_dir().join(format!("deckcheck-test-{}", Uuid::new_v4()));
        let (app, completion) = test_app(&dir).await;

        let request = webhook_request(&[
            text_part("sender", "founder@example.com"),
            text_part("subject", "Our pitch deck"),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
