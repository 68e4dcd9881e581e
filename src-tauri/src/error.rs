use thiserror::Error;

use crate::session::SessionStatus;

#[derive(Debug, Error)]
pub enum NeuroLensError {
    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<NeuroLensError> for String {
    fn from(err: NeuroLensError) -> Self {
        err.to_string()
    }
}

/// Failures of the upload → encode → request → report pipeline.
///
/// Everything here is caught at the session boundary: the encoder variants
/// leave the session untouched, the service variants move it to `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("File size exceeds limit (10MB): '{name}' is {size} bytes.")]
    SizeLimitExceeded { name: String, size: u64 },

    #[error("No files selected for analysis.")]
    NoFiles,

    #[error("Could not read '{name}': {reason}")]
    InvalidPayload { name: String, reason: String },

    #[error("Cannot start an analysis while the session is {from}. Reset first.")]
    InvalidTransition { from: SessionStatus },

    #[error("Analysis request failed: {0}")]
    TransportFailure(String),

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl From<AnalysisError> for String {
    fn from(err: AnalysisError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_message_mentions_limit() {
        let err = AnalysisError::SizeLimitExceeded {
            name: "video.mov".to_string(),
            size: 15 * 1024 * 1024,
        };
        let msg: String = err.into();
        assert!(msg.contains("File size exceeds limit (10MB)"));
        assert!(msg.contains("video.mov"));
    }

    #[test]
    fn test_invalid_transition_names_status() {
        let err = AnalysisError::InvalidTransition {
            from: SessionStatus::Success,
        };
        assert!(err.to_string().contains("success"));
    }
}
