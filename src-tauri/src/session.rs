//! Analysis session lifecycle.
//!
//! ```text
//! Idle --begin--> Analyzing --complete(Ok)--> Success
//!                           --complete(Err)-> Error
//! (any) --reset--> Idle
//! ```
//!
//! Every `begin` and every `reset` bumps the generation. A result is only
//! committed when it carries the ticket of the current generation and the
//! session is still analyzing, so a request that outlives a reset can never
//! overwrite a newer session.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyzer::{AnalysisConfig, AnalysisReport, ReasoningService};
use crate::encoder::{encode_batch, EncodedFile, FilePayload};
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Analyzing,
    Success,
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Success => "success",
            SessionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Analyzing {
        files: Vec<EncodedFile>,
    },
    Success {
        files: Vec<EncodedFile>,
        report: AnalysisReport,
    },
    Error {
        message: String,
    },
}

/// Proof that a request was started under a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// File metadata sent back to the UI (the payload stays in the backend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub media_type: String,
    pub preview: Option<String>,
}

impl From<&EncodedFile> for FileSummary {
    fn from(file: &EncodedFile) -> Self {
        Self {
            name: file.name.clone(),
            size: file.size,
            media_type: file.media_type.clone(),
            preview: file.preview.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub status: SessionStatus,
    pub files: Vec<FileSummary>,
    pub report: Option<AnalysisReport>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// The state machine itself. Not thread-safe; see [`SessionHandle`].
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    generation: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.phase.status()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn files(&self) -> &[EncodedFile] {
        match &self.phase {
            Phase::Analyzing { files } | Phase::Success { files, .. } => files,
            Phase::Idle | Phase::Error { .. } => &[],
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.phase {
            Phase::Success { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Fails unless the session is idle.
    pub fn ensure_can_begin(&self) -> Result<(), AnalysisError> {
        match self.status() {
            SessionStatus::Idle => Ok(()),
            from => Err(AnalysisError::InvalidTransition { from }),
        }
    }

    /// Idle → Analyzing with the given files.
    pub fn begin(&mut self, files: Vec<EncodedFile>) -> Result<Ticket, AnalysisError> {
        self.ensure_can_begin()?;
        if files.is_empty() {
            return Err(AnalysisError::NoFiles);
        }

        self.generation += 1;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        info!(
            "Session generation {} analyzing {} file(s)",
            self.generation,
            files.len()
        );
        self.phase = Phase::Analyzing { files };

        Ok(Ticket {
            generation: self.generation,
        })
    }

    /// Analyzing → Success | Error. Returns `false` when the ticket is stale
    /// and the result was dropped.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<AnalysisReport, AnalysisError>,
    ) -> bool {
        if ticket.generation != self.generation {
            info!(
                "Discarding stale analysis result for generation {} (current {})",
                ticket.generation, self.generation
            );
            return false;
        }

        let files = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Analyzing { files } => files,
            other => {
                warn!(
                    "Result for generation {} arrived while session is {:?}, ignoring",
                    ticket.generation,
                    other.status()
                );
                self.phase = other;
                return false;
            }
        };

        self.finished_at = Some(Utc::now());
        let result = result.and_then(|report| {
            let blank = report.blank_fields();
            if blank.is_empty() {
                Ok(report)
            } else {
                Err(AnalysisError::MalformedResponse(format!(
                    "empty field(s): {}",
                    blank.join(", ")
                )))
            }
        });
        self.phase = match result {
            Ok(report) => Phase::Success { files, report },
            Err(err) => {
                warn!("Analysis generation {} failed: {}", ticket.generation, err);
                Phase::Error {
                    message: err.to_string(),
                }
            }
        };
        true
    }

    /// Any state → Idle. Invalidates any request still in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::Idle;
        self.started_at = None;
        self.finished_at = None;
        info!("Session reset (generation {})", self.generation);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            generation: self.generation,
            status: self.status(),
            files: self.files().iter().map(FileSummary::from).collect(),
            report: self.report().cloned(),
            error: self.error_message().map(str::to_string),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

impl Phase {
    fn status(&self) -> SessionStatus {
        match self {
            Phase::Idle => SessionStatus::Idle,
            Phase::Analyzing { .. } => SessionStatus::Analyzing,
            Phase::Success { .. } => SessionStatus::Success,
            Phase::Error { .. } => SessionStatus::Error,
        }
    }
}

/// Shared, lockable session managed by Tauri.
#[derive(Default)]
pub struct SessionHandle {
    inner: Mutex<Session>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn ensure_can_begin(&self) -> Result<(), AnalysisError> {
        self.lock().ensure_can_begin()
    }

    pub fn reset(&self) -> SessionSnapshot {
        let mut session = self.lock();
        session.reset();
        session.snapshot()
    }

    /// Run one full analysis: encode, begin, call the service, commit.
    ///
    /// Encoder failures and invalid transitions are returned as `Err` and
    /// leave the session as it was. Service failures are recorded in the
    /// session (status `Error`) and the snapshot is returned as `Ok`. If the
    /// session was reset while the call was in flight, the result is dropped
    /// and the snapshot of the newer session is returned.
    pub async fn analyze<S>(
        &self,
        service: &S,
        config: &AnalysisConfig,
        payloads: Vec<FilePayload>,
    ) -> Result<SessionSnapshot, AnalysisError>
    where
        S: ReasoningService + ?Sized,
    {
        self.lock().ensure_can_begin()?;

        let files = encode_batch(payloads).await?;
        let ticket = self.lock().begin(files.clone())?;

        let result = service.analyze(&files, config).await;

        let mut session = self.lock();
        session.complete(ticket, result);
        Ok(session.snapshot())
    }

    /// Record a failure that happened before the service could be called
    /// (for example a missing API key) as the outcome of a fresh request.
    pub fn fail_before_request(
        &self,
        files: Vec<EncodedFile>,
        err: AnalysisError,
    ) -> Result<SessionSnapshot, AnalysisError> {
        let mut session = self.lock();
        let ticket = session.begin(files)?;
        session.complete(ticket, Err(err));
        Ok(session.snapshot())
    }
}
