//! Best-effort parsing of free-text model output
//!
//! Model responses are not contract-guaranteed, so parsing is modeled as a
//! fallible decode that always produces a usable value: either the parsed
//! payload or an explicit fallback carrying the reason. Parsers never
//! return errors.

use crate::pipeline::state::{Claim, UNKNOWN_COMPANY};
use regex_lite::Regex;
use serde::Deserialize;

/// Result of decoding unstructured model text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Structured payload recovered from the text
    Parsed(T),
    /// Decode failed; `value` is the degraded substitute
    Fallback { value: T, reason: String },
}

impl<T> ParseOutcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Parsed(value) => value,
            Self::Fallback { value, .. } => value,
        }
    }
}

/// Wire shape of the extraction response the prompt asks for.
#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    claims: Vec<Claim>,
}

/// Extract `(company_name, claims)` from extraction-stage model output.
///
/// Locates the first brace-delimited JSON object substring and parses the
/// `company_name` and `claims` fields. Any failure degrades to
/// `("Unknown", [])`.
pub fn parse_claims(raw_text: &str) -> ParseOutcome<(String, Vec<Claim>)> {
    let fallback = |reason: String| ParseOutcome::Fallback {
        value: (UNKNOWN_COMPANY.to_string(), Vec::new()),
        reason,
    };

    let start = match raw_text.find('{') {
        Some(idx) => idx,
        None => return fallback("no JSON object in model output".to_string()),
    };
    let end = match raw_text.rfind('}') {
        Some(idx) if idx > start => idx,
        _ => return fallback("unterminated JSON object in model output".to_string()),
    };

    match serde_json::from_str::<ExtractionPayload>(&raw_text[start..=end]) {
        Ok(payload) => {
            let company = payload
                .company_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
            ParseOutcome::Parsed((company, payload.claims))
        }
        Err(e) => fallback(format!("malformed extraction JSON: {}", e)),
    }
}

/// Extract a numbered list from question-stage model output.
///
/// Captures the remainder of every line starting with an integer followed by
/// `.` or `)`; non-matching lines are dropped. When nothing matches, the full
/// raw text is returned as a single-element fallback, so non-empty input
/// never yields an empty list.
pub fn parse_numbered_list(raw_text: &str) -> ParseOutcome<Vec<String>> {
    let pattern = Regex::new(r"^\d+[.)]\s*(.+)$").expect("static pattern");

    let items: Vec<String> = raw_text
        .lines()
        .filter_map(|line| {
            pattern
                .captures(line.trim())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect();

    if items.is_empty() {
        ParseOutcome::Fallback {
            value: vec![raw_text.to_string()],
            reason: "no numbered lines in model output".to_string(),
        }
    } else {
        ParseOutcome::Parsed(items)
    }
}
