//! The friction report and its validation.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::AnalysisError;

/// Structured result of one successful analysis.
///
/// All five fields are required and non-blank. [`parse_report`] enforces this
/// on the way in and the session enforces it again before committing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Inferred user goal
    pub detected_task: String,
    /// The identified problem
    pub friction_point: String,
    /// Fix strategy
    pub solution: String,
    /// The final artifact (code, document content, data)
    pub action_output: String,
    /// Trace of the reasoning path
    pub reason_map: String,
}

impl AnalysisReport {
    fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("detected_task", &self.detected_task),
            ("friction_point", &self.friction_point),
            ("solution", &self.solution),
            ("action_output", &self.action_output),
            ("reason_map", &self.reason_map),
        ]
    }

    /// Names of fields that are empty or whitespace only.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Parse the model's response text into a report.
///
/// Missing, null, non-string and blank fields are all malformed: a report is
/// all-or-nothing.
pub fn parse_report(text: &str) -> Result<AnalysisReport, AnalysisError> {
    let cleaned = strip_markdown_json(text);
    if cleaned.is_empty() {
        return Err(malformed("response contained no text".to_string()));
    }

    let report: AnalysisReport = serde_json::from_str(&cleaned).map_err(|e| {
        malformed(format!(
            "response does not match the report shape ({}). Raw response (first 500 chars): {}",
            e,
            truncate(&cleaned, 500)
        ))
    })?;

    let blank = report.blank_fields();
    if !blank.is_empty() {
        return Err(malformed(format!("empty field(s): {}", blank.join(", "))));
    }

    Ok(report)
}

fn malformed(msg: String) -> AnalysisError {
    error!("Malformed analysis response: {}", msg);
    AnalysisError::MalformedResponse(msg)
}

/// Strip markdown code fences if the model wrapped its JSON in them.
pub(crate) fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        // single-line fence: drop the language tag up to the JSON body
        None => {
            let body = trimmed.trim_start_matches('`');
            match body.find(['{', '[']) {
                Some(pos) => &body[pos..],
                None => body,
            }
        }
    };
    let cleaned = after_open.trim_end();
    cleaned
        .strip_suffix("```")
        .unwrap_or(cleaned)
        .trim()
        .to_string()
}

/// Truncate on a char boundary.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
