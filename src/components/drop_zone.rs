//! Multi-file drop zone with drag-and-drop and a browse button.

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::commands::FilePayload;
use crate::upload::{self, ACCEPTED_TYPES};

/// Reads the selection and hands the payloads to `on_ready`. Size and read
/// failures go to `on_rejected` instead; nothing is sent to the backend.
#[component]
pub fn DropZone(
    on_ready: Callback<Vec<FilePayload>>,
    on_rejected: Callback<String>,
) -> impl IntoView {
    let (is_over, set_is_over) = signal(false);
    let (is_loading, set_is_loading) = signal(false);
    let file_input_id = "upload-file-input";

    let process = move |files: Vec<web_sys::File>| {
        if files.is_empty() {
            return;
        }
        set_is_loading.set(true);
        spawn_local(async move {
            match upload::read_files(files).await {
                Ok(payloads) => on_ready.run(payloads),
                Err(e) => {
                    web_sys::console::warn_1(&format!("Upload rejected: {}", e).into());
                    on_rejected.run(e);
                }
            }
            set_is_loading.set(false);
        });
    };

    let on_drop = move |ev: web_sys::DragEvent| {
        ev.prevent_default();
        set_is_over.set(false);
        if let Some(list) = ev.data_transfer().and_then(|dt| dt.files()) {
            process(upload::files_from_list(&list));
        }
    };

    let on_input_change = move |ev: web_sys::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        if let Some(list) = input.files() {
            process(upload::files_from_list(&list));
        }
        // allow picking the same file again after a rejection
        input.set_value("");
    };

    view! {
        <div
            class="drop-zone"
            class:drop-zone-active=move || is_over.get()
            class:drop-zone-loading=move || is_loading.get()
            on:dragover=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                set_is_over.set(true);
            }
            on:dragleave=move |_| set_is_over.set(false)
            on:drop=on_drop
        >
            <Show
                when=move || is_loading.get()
                fallback=move || view! {
                    <div class="drop-zone-content">
                        <p class="drop-main">"Drop screenshots or documents here"</p>
                        <p class="drop-hint">"or"</p>
                        <label for=file_input_id class="btn btn-secondary">
                            "Browse Files"
                        </label>
                        <input
                            type="file"
                            id=file_input_id
                            accept=ACCEPTED_TYPES
                            multiple=true
                            style="display: none"
                            on:change=on_input_change
                        />
                        <p class="drop-formats">"Images, PDF, text, CSV, JSON, XML. Up to 10MB per file."</p>
                    </div>
                }
            >
                <div class="drop-zone-loading-content">
                    <div class="spinner"></div>
                    <p>"Reading files..."</p>
                </div>
            </Show>
        </div>
    }
}
