//! Upload and analysis page.
//!
//! The page state lives in an [`AnalysisSession`] context provided by the app
//! root, so an analysis keeps running when the user switches pages. Every
//! start and every reset takes a new request id; a completion whose id is no
//! longer current is dropped.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::browser;
use crate::commands::{self, AnalysisReport, FilePayload, FileSummary, SessionSnapshot, SessionStatus};
use crate::components::drop_zone::DropZone;
use crate::components::report_view::{FileStrip, ReportView};
use crate::upload;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    /// Waiting for files
    Idle,
    /// Request in flight for these files
    Analyzing(Vec<FileSummary>),
    Success {
        report: AnalysisReport,
        files: Vec<FileSummary>,
    },
    Error(String),
}

impl AnalysisState {
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        match snapshot.status {
            SessionStatus::Idle => AnalysisState::Idle,
            SessionStatus::Analyzing => AnalysisState::Analyzing(snapshot.files),
            SessionStatus::Success => match snapshot.report {
                Some(report) => AnalysisState::Success {
                    report,
                    files: snapshot.files,
                },
                None => AnalysisState::Error("Analysis finished without a report.".to_string()),
            },
            SessionStatus::Error => AnalysisState::Error(
                snapshot
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
        }
    }
}

/// Monotonic id of the latest start or reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounter(u64);

impl RequestCounter {
    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, id: u64) -> bool {
        self.0 == id
    }
}

#[derive(Clone, Copy)]
pub struct AnalysisSession {
    pub state: RwSignal<AnalysisState>,
    /// Rejections that leave the session idle, e.g. an oversized file
    pub notice: RwSignal<Option<String>>,
    request: StoredValue<RequestCounter>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(AnalysisState::Idle),
            notice: RwSignal::new(None),
            request: StoredValue::new(RequestCounter::default()),
        }
    }

    fn next_request(&self) -> u64 {
        self.request.update_value(|c| {
            c.bump();
        });
        self.request.with_value(|c| c.0)
    }

    fn is_current(&self, id: u64) -> bool {
        self.request.with_value(|c| c.is_current(id))
    }

    pub fn start(&self, payloads: Vec<FilePayload>) {
        if !matches!(self.state.get_untracked(), AnalysisState::Idle) {
            return;
        }
        let id = self.next_request();
        let session = *self;
        self.notice.set(None);
        self.state.set(AnalysisState::Analyzing(
            payloads.iter().map(upload::summarize).collect(),
        ));

        spawn_local(async move {
            let result = commands::analyze_files(&payloads).await;
            if !session.is_current(id) {
                web_sys::console::log_1(&format!("Dropping stale analysis result #{}", id).into());
                return;
            }
            match result {
                Ok(snapshot) => session.state.set(AnalysisState::from_snapshot(snapshot)),
                Err(e) => {
                    // The backend rejected the batch without changing its session.
                    session.notice.set(Some(e));
                    session.sync(id).await;
                }
            }
        });
    }

    pub fn reset(&self) {
        self.next_request();
        self.notice.set(None);
        self.state.set(AnalysisState::Idle);
        spawn_local(async move {
            if let Err(e) = commands::reset_session().await {
                web_sys::console::error_1(&format!("Failed to reset session: {}", e).into());
            }
        });
    }

    /// Adopt the backend session, polling while it is still analyzing.
    async fn sync(self, id: u64) {
        loop {
            let snapshot = match commands::get_session().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to load session: {}", e).into());
                    if self.is_current(id) {
                        self.state.set(AnalysisState::Idle);
                    }
                    return;
                }
            };
            if !self.is_current(id) {
                return;
            }
            let still_running = snapshot.status == SessionStatus::Analyzing;
            self.state.set(AnalysisState::from_snapshot(snapshot));
            if !still_running {
                return;
            }
            browser::sleep(1000).await;
        }
    }

    /// Pick up whatever the backend holds, e.g. after a webview reload.
    pub fn restore(&self) {
        let id = self.next_request();
        let session = *self;
        spawn_local(async move { session.sync(id).await });
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

#[component]
pub fn AnalysisPage() -> impl IntoView {
    let session = expect_context::<AnalysisSession>();

    let on_ready = Callback::new(move |payloads: Vec<FilePayload>| session.start(payloads));
    let on_rejected = Callback::new(move |msg: String| session.notice.set(Some(msg)));
    let on_reset = move |_| session.reset();

    view! {
        <div class="page analysis-page">
            <h2>"Friction Analysis"</h2>
            <p class="page-description">
                "Drop screenshots, documents or data files to find where your workflow stalls."
            </p>

            {move || match session.state.get() {
                AnalysisState::Idle => view! {
                    <div class="idle-state">
                        <DropZone on_ready=on_ready on_rejected=on_rejected />
                        {move || session.notice.get().map(|msg| view! {
                            <div class="upload-notice status-error">{msg}</div>
                        })}
                    </div>
                }.into_any(),

                AnalysisState::Analyzing(files) => {
                    let count = files.len();
                    view! {
                        <div class="analyzing-state">
                            <FileStrip files=files.clone() />
                            <div class="thumbs">
                                {files.into_iter().filter_map(|f| f.preview).map(|src| view! {
                                    <img src=src class="preview-image analyzing" alt="Analyzing..." />
                                }).collect_view()}
                            </div>
                            <div class="loading-indicator">
                                <div class="spinner"></div>
                                <p>{format!("Analyzing {} file{}...", count, if count == 1 { "" } else { "s" })}</p>
                                <p class="hint">"This may take up to a minute"</p>
                            </div>
                        </div>
                    }.into_any()
                },

                AnalysisState::Success { report, files } => view! {
                    <div class="analysis-results">
                        <ReportView report=report files=files />
                        <div class="action-buttons">
                            <button class="btn btn-secondary" on:click=on_reset>
                                "Analyze Something Else"
                            </button>
                        </div>
                    </div>
                }.into_any(),

                AnalysisState::Error(msg) => view! {
                    <div class="error-state">
                        <div class="error-message">
                            <h3>"Analysis Terminated"</h3>
                            <p>{msg}</p>
                        </div>
                        <button class="btn btn-secondary" on:click=on_reset>
                            "Re-initialize"
                        </button>
                    </div>
                }.into_any(),
            }}
        </div>
    }
}
