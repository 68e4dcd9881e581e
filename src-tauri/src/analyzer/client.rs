//! Gemini `generateContent` client for friction analysis.
//!
//! One invocation is exactly one HTTP round trip: no retry, no streaming,
//! no caching. Transport problems and service rejections become
//! `TransportFailure`; anything wrong with the returned text becomes
//! `MalformedResponse`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::prompts::AnalysisConfig;
use super::types::{parse_report, truncate, AnalysisReport};
use crate::encoder::EncodedFile;
use crate::error::AnalysisError;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Anything that can turn a batch of files into a report.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn analyze(
        &self,
        files: &[EncodedFile],
        config: &AnalysisConfig,
    ) -> Result<AnalysisReport, AnalysisError>;
}

/// Connection settings for the Gemini API.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    settings: ClientSettings,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, settings: ClientSettings) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                AnalysisError::TransportFailure(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.model)
        )
    }

    async fn send(&self, body: &GenerateContentRequest) -> Result<String, AnalysisError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    format!(
                        "Gemini API timeout after {}s",
                        self.settings.timeout.as_secs()
                    )
                } else {
                    format!("Gemini API request failed: {}", e)
                };
                error!("{}", msg);
                AnalysisError::TransportFailure(msg)
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            let msg = format!("Failed to read Gemini response body: {}", e);
            error!("{}", msg);
            AnalysisError::TransportFailure(msg)
        })?;

        if !status.is_success() {
            let msg = describe_http_error(status, &body_text);
            error!("Gemini API error: {}", msg);
            return Err(AnalysisError::TransportFailure(msg));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body_text).map_err(|e| {
            AnalysisError::MalformedResponse(format!(
                "Failed to parse Gemini response wrapper: {}",
                e
            ))
        })?;

        extract_text(parsed)
    }
}

#[async_trait]
impl ReasoningService for GeminiClient {
    async fn analyze(
        &self,
        files: &[EncodedFile],
        config: &AnalysisConfig,
    ) -> Result<AnalysisReport, AnalysisError> {
        if files.is_empty() {
            return Err(AnalysisError::NoFiles);
        }
        info!(
            "Requesting analysis of {} file(s) ({} image) from model '{}'",
            files.len(),
            files.iter().filter(|f| f.is_image()).count(),
            self.settings.model
        );

        let request = build_request(files, config);
        let text = self.send(&request).await?;
        let report = parse_report(&text)?;

        info!("Analysis complete: task '{}'", report.detected_task);
        Ok(report)
    }
}

/// Assemble the request body: files in order, then the instruction.
pub(crate) fn build_request(files: &[EncodedFile], config: &AnalysisConfig) -> GenerateContentRequest {
    let mut parts: Vec<Part> = files
        .iter()
        .map(|file| Part::InlineData {
            inline_data: InlineData {
                mime_type: file.media_type.clone(),
                data: file.data.clone(),
            },
        })
        .collect();
    parts.push(Part::Text {
        text: config.instruction.clone(),
    });

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
        system_instruction: SystemInstruction {
            parts: vec![Part::Text {
                text: config.policy.clone(),
            }],
        },
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: config.output_contract.clone(),
        },
    }
}

/// Concatenate the non-thought text parts of the first candidate.
pub(crate) fn extract_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        let msg = format!("Request blocked by the service ({})", reason);
        error!("{}", msg);
        return Err(AnalysisError::TransportFailure(msg));
    }

    let text: String = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::MalformedResponse(
            "No response text from Gemini".to_string(),
        ));
    }
    Ok(text)
}

/// Human-readable message for a non-2xx response.
pub(crate) fn describe_http_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper
                .error
                .message
                .unwrap_or_else(|| truncate(body, 1024));
            match wrapper.error.status {
                Some(s) if !s.is_empty() => format!("{} ({}): {}", status, s, message),
                _ => format!("{}: {}", status, message),
            }
        }
        Err(_) => format!("{}: {}", status, truncate(body, 1024)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: SystemInstruction,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
