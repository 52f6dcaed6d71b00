//! Analysis report delivery over email
//!
//! `ReportMailer` never raises: delivery failure is reported as `false` and
//! logged, since an undeliverable report should not fail the webhook that
//! produced it.

use crate::config::SmtpConfig;
use crate::errors::AppError;
use crate::pipeline::state::AnalysisReport;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Send the analysis report. Returns whether delivery was accepted.
    async fn send_report(&self, to: &str, report: &AnalysisReport) -> bool;
}

/// SMTP mailer (STARTTLS relay, e.g. Gmail with an app password).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let from_address = config
            .from_address
            .clone()
            .ok_or_else(|| AppError::ValidationError("smtp.from_address not configured".to_string()))?;
        let password = config
            .password
            .clone()
            .ok_or_else(|| AppError::ValidationError("smtp.password not configured".to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::EmailDeliveryFailed(format!("bad SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(from_address.clone(), password))
            .build();

        Ok(Self {
            transport,
            from_address,
        })
    }
}

#[async_trait]
impl ReportMailer for SmtpMailer {
    async fn send_report(&self, to: &str, report: &AnalysisReport) -> bool {
        let message = Message::builder()
            .from(match format!("Deckcheck <{}>", self.from_address).parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    error!(error = %e, "Invalid sender address");
                    return false;
                }
            })
            .to(match to.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    warn!(to = %to, error = %e, "Invalid recipient address");
                    return false;
                }
            })
            .subject(format!("Pitch Deck Analysis: {}", report.company_name))
            .header(ContentType::TEXT_HTML)
            .body(format_report_html(report));

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Failed to build report email");
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                info!(to = %to, company = %report.company_name, "Report email sent");
                metrics::counter!("deckcheck_reports_emailed_total").increment(1);
                true
            }
            Err(e) => {
                error!(to = %to, error = %e, "Failed to send report email");
                false
            }
        }
    }
}

/// Mailer used when no SMTP credentials are configured.
pub struct DisabledMailer;

#[async_trait]
impl ReportMailer for DisabledMailer {
    async fn send_report(&self, to: &str, _report: &AnalysisReport) -> bool {
        warn!(to = %to, "Email delivery disabled: no SMTP credentials configured");
        false
    }
}

/// Render the analysis report as an HTML email body.
fn format_report_html(report: &AnalysisReport) -> String {
    let mut verifications = String::new();
    for (i, result) in report.verification_results.iter().enumerate() {
        verifications.push_str(&format!(
            "<div style=\"margin-bottom: 20px; padding: 15px; background: #f9fafb; border-left: 4px solid #4f46e5;\">\
             <h3 style=\"margin-top: 0; font-size: 16px;\">{}. {}</h3>\
             <div style=\"font-size: 14px; white-space: pre-wrap;\">{}</div>\
             </div>",
            i + 1,
            escape_html(&result.claim),
            escape_html(&result.verification_text)
        ));
    }

    let mut questions = String::new();
    for question in &report.questions {
        questions.push_str(&format!(
            "<li style=\"margin-bottom: 10px; font-size: 14px;\">{}</li>",
            escape_html(question)
        ));
    }

    format!(
        "<!DOCTYPE html>\
         <html><body style=\"font-family: sans-serif; line-height: 1.6; max-width: 600px; margin: 0 auto; padding: 20px;\">\
         <h1>Pitch Deck Verification Report</h1>\
         <p><b>Company:</b> {company}</p>\
         <p><b>Claims extracted:</b> {total} &middot; <b>Verified:</b> {verified} &middot; <b>Questions:</b> {questions_count}</p>\
         <h2>Verification Results</h2>{verifications}\
         <h2>Questions for the Founder</h2><ol>{questions}</ol>\
         <p style=\"color: #6b7280; font-size: 12px;\">Generated by Deckcheck</p>\
         </body></html>",
        company = escape_html(&report.company_name),
        total = report.summary.total_claims,
        verified = report.summary.verified_claims,
        questions_count = report.summary.questions_generated,
        verifications = verifications,
        questions = questions,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
