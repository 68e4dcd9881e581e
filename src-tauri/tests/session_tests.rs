use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::sync::Notify;

use neurolens_tauri::{
    AnalysisConfig, AnalysisError, AnalysisReport, EncodedFile, FilePayload, ReasoningService,
    SessionHandle, SessionStatus, MAX_FILE_BYTES,
};

/// Scripted stand-in for the Gemini client.
struct ScriptedService {
    result: Result<AnalysisReport, AnalysisError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<String>>>,
    gate: Option<Gate>,
}

struct Gate {
    started: Notify,
    release: Notify,
}

impl ScriptedService {
    fn returning(result: Result<AnalysisReport, AnalysisError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated(result: Result<AnalysisReport, AnalysisError>) -> Self {
        Self {
            gate: Some(Gate {
                started: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::returning(result)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for ScriptedService {
    async fn analyze(
        &self,
        files: &[EncodedFile],
        _config: &AnalysisConfig,
    ) -> Result<AnalysisReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push(files.iter().map(|f| f.name.clone()).collect());
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        self.result.clone()
    }
}

fn report(task: &str) -> AnalysisReport {
    AnalysisReport {
        detected_task: task.to_string(),
        friction_point: "Manual re-typing of invoice totals".to_string(),
        solution: "Export the table as CSV".to_string(),
        action_output: "Date,Amount\n2024-01-02,120.00".to_string(),
        reason_map: "The screenshot shows a spreadsheet next to an email.".to_string(),
    }
}

fn payload(name: &str, media_type: Option<&str>, bytes: &[u8]) -> FilePayload {
    FilePayload {
        name: name.to_string(),
        size: bytes.len() as u64,
        media_type: media_type.map(str::to_string),
        data: STANDARD.encode(bytes),
    }
}

fn screenshot() -> FilePayload {
    payload("screen.png", Some("image/png"), &[0x89, b'P', b'N', b'G', 0x0D, 0x0A])
}

fn oversized(name: &str) -> FilePayload {
    FilePayload {
        name: name.to_string(),
        size: MAX_FILE_BYTES + 1,
        media_type: Some("application/pdf".to_string()),
        data: String::new(),
    }
}

#[tokio::test]
async fn test_single_screenshot_success() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(report("Reconciling invoices")));

    let snap = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Success);
    assert_eq!(snap.report, Some(report("Reconciling invoices")));
    assert!(snap.error.is_none());
    assert_eq!(snap.files.len(), 1);
    assert_eq!(snap.files[0].media_type, "image/png");
    assert!(snap.files[0]
        .preview
        .as_deref()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_blank_report_from_service_ends_in_error() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(AnalysisReport {
        detected_task: String::new(),
        friction_point: String::new(),
        solution: String::new(),
        action_output: String::new(),
        reason_map: String::new(),
    }));

    let snap = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Error);
    assert!(snap.report.is_none());
    let message = snap.error.unwrap();
    assert!(message.contains("Malformed"));
    assert!(message.contains("action_output"));
}

#[tokio::test]
async fn test_partially_blank_report_is_not_a_success() {
    let session = SessionHandle::new();
    let mut partial = report("Summarize the thread");
    partial.reason_map = " \n ".to_string();
    let service = ScriptedService::returning(Ok(partial));

    let snap = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Error);
    assert!(snap.error.unwrap().contains("reason_map"));
}

#[tokio::test]
async fn test_multi_file_batch_keeps_order_and_types() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(report("Comparing quotes")));
    let files = vec![
        screenshot(),
        payload("quote.pdf", Some("application/pdf"), b"%PDF-1.7"),
        payload("notes", None, b"plain bytes"),
    ];

    let snap = session
        .analyze(&service, &AnalysisConfig::default(), files)
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Success);
    let types: Vec<_> = snap.files.iter().map(|f| f.media_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["image/png", "application/pdf", "application/octet-stream"]
    );
    assert!(snap.files[1].preview.is_none());
    assert_eq!(
        service.seen.lock().unwrap()[0],
        vec!["screen.png", "quote.pdf", "notes"]
    );
}

#[tokio::test]
async fn test_oversized_file_fails_whole_batch_without_calling_service() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(report("unused")));

    let err = session
        .analyze(
            &service,
            &AnalysisConfig::default(),
            vec![screenshot(), oversized("scan.pdf")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::SizeLimitExceeded { ref name, .. } if name == "scan.pdf"));
    assert!(err.to_string().contains("File size exceeds limit (10MB)"));
    assert_eq!(service.calls(), 0);

    let snap = session.snapshot();
    assert_eq!(snap.status, SessionStatus::Idle);
    assert!(snap.files.is_empty());
}

#[tokio::test]
async fn test_file_exactly_at_limit_is_accepted() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(report("Large log review")));
    let bytes = vec![b'a'; MAX_FILE_BYTES as usize];

    let snap = session
        .analyze(
            &service,
            &AnalysisConfig::default(),
            vec![payload("server.log", Some("text/plain"), &bytes)],
        )
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Success);
    assert_eq!(snap.files[0].size, MAX_FILE_BYTES);
}

#[tokio::test]
async fn test_transport_failure_lands_in_error_state() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Err(AnalysisError::TransportFailure(
        "API error (401 Unauthorized)".to_string(),
    )));

    let snap = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Error);
    assert!(snap.report.is_none());
    assert!(snap.error.as_deref().unwrap().contains("401"));

    let idle = session.reset();
    assert_eq!(idle.status, SessionStatus::Idle);
    assert!(idle.error.is_none());
}

#[tokio::test]
async fn test_malformed_response_lands_in_error_state() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Err(AnalysisError::MalformedResponse(
        "missing field `solution`".to_string(),
    )));

    let snap = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();

    assert_eq!(snap.status, SessionStatus::Error);
    assert!(snap.error.as_deref().unwrap().contains("Malformed"));
}

#[tokio::test]
async fn test_second_analysis_requires_reset() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(report("First")));
    session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();

    let err = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InvalidTransition {
            from: SessionStatus::Success
        }
    );
    assert_eq!(service.calls(), 1);

    session.reset();
    let snap = session
        .analyze(&service, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();
    assert_eq!(snap.status, SessionStatus::Success);
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let session = SessionHandle::new();
    let first = session.reset();
    let second = session.reset();
    assert_eq!(first.status, SessionStatus::Idle);
    assert_eq!(second.status, SessionStatus::Idle);
    assert!(second.files.is_empty() && second.report.is_none() && second.error.is_none());
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let session = SessionHandle::new();
    let service = ScriptedService::returning(Ok(report("unused")));
    let err = session
        .analyze(&service, &AnalysisConfig::default(), vec![])
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::NoFiles);
    assert_eq!(service.calls(), 0);
    assert_eq!(session.snapshot().status, SessionStatus::Idle);
}

#[tokio::test]
async fn test_analyzing_state_is_visible_while_in_flight() {
    let session = Arc::new(SessionHandle::new());
    let service = Arc::new(ScriptedService::gated(Ok(report("Slow task"))));

    let task = {
        let session = Arc::clone(&session);
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            session
                .analyze(service.as_ref(), &AnalysisConfig::default(), vec![screenshot()])
                .await
        })
    };

    service.gate.as_ref().unwrap().started.notified().await;
    let during = session.snapshot();
    assert_eq!(during.status, SessionStatus::Analyzing);
    assert_eq!(during.files.len(), 1);
    assert!(during.report.is_none() && during.error.is_none());

    service.gate.as_ref().unwrap().release.notify_one();
    let done = task.await.unwrap().unwrap();
    assert_eq!(done.status, SessionStatus::Success);
}

#[tokio::test]
async fn test_response_after_reset_is_discarded() {
    let session = Arc::new(SessionHandle::new());
    let slow = Arc::new(ScriptedService::gated(Ok(report("Stale result"))));

    let task = {
        let session = Arc::clone(&session);
        let slow = Arc::clone(&slow);
        tokio::spawn(async move {
            session
                .analyze(slow.as_ref(), &AnalysisConfig::default(), vec![screenshot()])
                .await
        })
    };

    slow.gate.as_ref().unwrap().started.notified().await;
    let idle = session.reset();
    assert_eq!(idle.status, SessionStatus::Idle);

    slow.gate.as_ref().unwrap().release.notify_one();
    let returned = task.await.unwrap().unwrap();
    assert_eq!(returned.status, SessionStatus::Idle);
    assert!(returned.report.is_none());
    assert_eq!(session.snapshot().status, SessionStatus::Idle);
}

#[tokio::test]
async fn test_stale_response_does_not_overwrite_newer_session() {
    let session = Arc::new(SessionHandle::new());
    let slow = Arc::new(ScriptedService::gated(Ok(report("Stale result"))));
    let fast = ScriptedService::returning(Err(AnalysisError::TransportFailure(
        "connection reset".to_string(),
    )));

    let task = {
        let session = Arc::clone(&session);
        let slow = Arc::clone(&slow);
        tokio::spawn(async move {
            session
                .analyze(slow.as_ref(), &AnalysisConfig::default(), vec![screenshot()])
                .await
        })
    };

    slow.gate.as_ref().unwrap().started.notified().await;
    session.reset();
    let newer = session
        .analyze(&fast, &AnalysisConfig::default(), vec![screenshot()])
        .await
        .unwrap();
    assert_eq!(newer.status, SessionStatus::Error);

    slow.gate.as_ref().unwrap().release.notify_one();
    task.await.unwrap().unwrap();

    let snap = session.snapshot();
    assert_eq!(snap.status, SessionStatus::Error);
    assert_eq!(snap.generation, newer.generation);
    assert!(snap.report.is_none());
}
