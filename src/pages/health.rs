use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, HealthReport};
use crate::components::status_badge::{CheckStatus, StatusBadge};

#[component]
pub fn HealthPage() -> impl IntoView {
    let (checking, set_checking) = signal(false);
    let (report, set_report) = signal::<Option<HealthReport>>(None);
    let (error, set_error) = signal::<Option<String>>(None);

    let do_health_check = move || {
        set_checking.set(true);
        set_error.set(None);
        spawn_local(async move {
            match commands::run_health_check().await {
                Ok(r) => set_report.set(Some(r)),
                Err(e) => set_error.set(Some(format!("Health check failed: {}", e))),
            }
            set_checking.set(false);
        });
    };

    Effect::new(move |_| {
        do_health_check();
    });

    view! {
        <div class="page health-page">
            <h2>"Health Check"</h2>
            <p class="page-description">
                "Verify that NeuroLens can reach the analysis service with your settings."
            </p>

            <button
                class="btn btn-primary"
                on:click=move |_| do_health_check()
                disabled=move || checking.get()
            >
                {move || if checking.get() { "Checking..." } else { "Run Health Check" }}
            </button>

            {move || error.get().map(|e| view! {
                <div class="health-error">
                    <span class="status-text status-error">{e}</span>
                </div>
            })}

            {move || report.get().map(|r| {
                let key_detail = match &r.api_key_source {
                    Some(source) if source == "keychain" => "From keychain".to_string(),
                    Some(var) => format!("From ${}", var),
                    None => "Not configured".to_string(),
                };
                let settings_ok = r.settings_error.is_none();
                let settings_detail = r.settings_error.clone().unwrap_or_else(|| {
                    format!(
                        "{} at {}",
                        r.model.clone().unwrap_or_default(),
                        r.api_base_url.clone().unwrap_or_default()
                    )
                });
                let (prompt_status, prompt_detail) = if r.analysis_config_overridden {
                    (
                        CheckStatus::Pass,
                        format!("Overridden by {}", r.analysis_config_path.clone().unwrap_or_default()),
                    )
                } else {
                    (CheckStatus::Off, "Built-in defaults".to_string())
                };
                let ready = r.api_key_set && settings_ok;

                view! {
                    <div class="health-results">
                        <StatusBadge label="Gemini API Key" status=CheckStatus::from_bool(r.api_key_set) detail=key_detail />
                        <StatusBadge label="Model Settings" status=CheckStatus::from_bool(settings_ok) detail=settings_detail />
                        <StatusBadge label="Analysis Prompts" status=prompt_status detail=prompt_detail />

                        <div class={if ready { "health-summary summary-all-pass" } else { "health-summary summary-all-fail" }}>
                            {if ready { "Ready to analyze" } else { "Not ready: fix the failing checks above" }}
                        </div>
                    </div>
                }
            })}
        </div>
    }
}
