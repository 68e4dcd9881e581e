use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::browser;
use crate::commands::{AnalysisReport, FileSummary};
use crate::upload::{format_size, total_size};

#[component]
pub fn FileStrip(files: Vec<FileSummary>) -> impl IntoView {
    let count = files.len();
    let total = format_size(total_size(&files));
    let primary_type = files
        .first()
        .map(|f| f.media_type.clone())
        .unwrap_or_else(|| "N/A".to_string());

    view! {
        <div class="file-strip">
            <div class="file-strip-meta">
                <span>{format!("{} file{}", count, if count == 1 { "" } else { "s" })}</span>
                <span>{total}</span>
                <span class="file-type">{primary_type}</span>
            </div>
            <ul class="file-list">
                {files.into_iter().map(|f| view! {
                    <li class="file-chip" title=f.media_type.clone()>
                        {f.name}
                        <span class="file-size">{format_size(f.size)}</span>
                    </li>
                }).collect_view()}
            </ul>
        </div>
    }
}

/// The five report sections, with the first image as the visual target.
#[component]
pub fn ReportView(report: AnalysisReport, files: Vec<FileSummary>) -> impl IntoView {
    let (copied, set_copied) = signal(false);
    let (copy_error, set_copy_error) = signal::<Option<String>>(None);
    let visual_target = files.iter().find_map(|f| f.preview.clone());

    let artifact = report.action_output.clone();
    let on_copy = move |_| {
        let text = artifact.clone();
        spawn_local(async move {
            match browser::copy_to_clipboard(&text).await {
                Ok(()) => {
                    set_copy_error.set(None);
                    set_copied.set(true);
                    browser::sleep(2000).await;
                    set_copied.set(false);
                }
                Err(e) => {
                    web_sys::console::error_1(&e.clone().into());
                    set_copy_error.set(Some(e));
                }
            }
        });
    };

    view! {
        <div class="report">
            <FileStrip files=files />

            {visual_target.map(|src| view! {
                <img src=src class="preview-image" alt="Analysis target" />
            })}

            <section class="report-section report-task">
                <span class="section-tag">"01. Intent Detected"</span>
                <h3>{report.detected_task}</h3>
            </section>

            <section class="report-section report-friction">
                <span class="section-tag">"02. Friction Point"</span>
                <p>{report.friction_point}</p>
            </section>

            <section class="report-section report-solution">
                <span class="section-tag">"03. Resolution"</span>
                <p class="solution-text">{report.solution}</p>
            </section>

            <section class="report-section report-artifact">
                <div class="artifact-header">
                    <span class="section-tag">"04. Action Output"</span>
                    <button class="btn btn-secondary btn-copy" on:click=on_copy>
                        {move || if copied.get() { "Copied" } else { "Copy Contents" }}
                    </button>
                </div>
                {move || copy_error.get().map(|e| view! {
                    <span class="status-text status-error">{e}</span>
                })}
                <pre class="artifact-body">{report.action_output}</pre>
            </section>

            <footer class="report-section report-trace">
                <span class="section-tag">"Reasoning Trace"</span>
                <p class="trace-text">{format!("> {}", report.reason_map)}</p>
            </footer>
        </div>
    }
}
