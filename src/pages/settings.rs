use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, ModelInfo, GEMINI_KEY_SERVICE};
use crate::components::api_key_form::ApiKeyForm;

const PREF_MODEL: &str = "ai_model";
const PREF_BASE_URL: &str = "api_base_url";
const PREF_TIMEOUT_SECS: &str = "request_timeout_secs";

/// Text preference backed by the store. An empty value restores the default.
#[component]
fn PreferenceField(
    pref_key: &'static str,
    #[prop(into)] label: String,
    #[prop(into)] placeholder: String,
    /// id of a `<datalist>` offering suggestions
    #[prop(optional)]
    list: Option<&'static str>,
) -> impl IntoView {
    let (value, set_value) = signal(String::new());
    let (status, set_status) = signal::<Option<String>>(None);

    Effect::new(move |_| {
        spawn_local(async move {
            match commands::get_preference(pref_key).await {
                Ok(Some(saved)) => set_value.set(saved),
                Ok(None) => {}
                Err(e) => set_status.set(Some(format!("Failed to load preference: {}", e))),
            }
        });
    });

    let save = move |_| {
        let v = value.get();
        spawn_local(async move {
            match commands::set_preference(pref_key, v.trim()).await {
                Ok(()) if v.trim().is_empty() => set_status.set(Some("Reset to default".to_string())),
                Ok(()) => set_status.set(Some("Saved".to_string())),
                Err(e) => set_status.set(Some(format!("Failed to save: {}", e))),
            }
        });
    };

    view! {
        <div class="form-group">
            <label for=pref_key>{label}</label>
            <div class="input-row">
                <input
                    id=pref_key
                    type="text"
                    placeholder=placeholder
                    class="input"
                    list=list
                    prop:value=move || value.get()
                    on:input=move |ev| set_value.set(event_target_value(&ev))
                />
                <button class="btn btn-save" on:click=save>"Save"</button>
            </div>
            <Show when=move || status.get().is_some()>
                <span class="status-text">{move || status.get().unwrap_or_default()}</span>
            </Show>
        </div>
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let (models, set_models) = signal::<Vec<ModelInfo>>(Vec::new());
    let (models_status, set_models_status) = signal::<Option<String>>(None);
    let (loading_models, set_loading_models) = signal(false);

    let load_models = move |_| {
        set_loading_models.set(true);
        set_models_status.set(None);
        spawn_local(async move {
            match commands::list_models().await {
                Ok(list) => {
                    set_models_status.set(Some(format!("{} models available", list.len())));
                    set_models.set(list);
                }
                Err(e) => set_models_status.set(Some(format!("Failed to list models: {}", e))),
            }
            set_loading_models.set(false);
        });
    };

    view! {
        <div class="page settings-page">
            <h2>"Settings"</h2>

            <section class="settings-section">
                <h3>"API Key"</h3>
                <p class="section-description">
                    "The Gemini API key is stored in your system keychain. "
                    "GEMINI_API_KEY or API_KEY from the environment is used when none is stored."
                </p>
                <ApiKeyForm
                    service_name="Gemini API Key"
                    service_id=GEMINI_KEY_SERVICE
                    placeholder="AIza..."
                />
            </section>

            <section class="settings-section">
                <h3>"Model"</h3>
                <p class="section-description">"Leave a field empty and save to use the default."</p>

                <PreferenceField
                    pref_key=PREF_MODEL
                    label="Model"
                    placeholder="gemini-3-pro-preview"
                    list="model-options"
                />
                <datalist id="model-options">
                    {move || models.get().into_iter().map(|m| view! {
                        <option value=m.id>{m.name}</option>
                    }).collect_view()}
                </datalist>
                <div class="input-row">
                    <button
                        class="btn btn-secondary"
                        on:click=load_models
                        disabled=move || loading_models.get()
                    >
                        {move || if loading_models.get() { "Loading..." } else { "Load Available Models" }}
                    </button>
                    <span class="status-text">{move || models_status.get().unwrap_or_default()}</span>
                </div>
            </section>

            <section class="settings-section">
                <h3>"Connection"</h3>
                <PreferenceField
                    pref_key=PREF_BASE_URL
                    label="API Base URL"
                    placeholder="https://generativelanguage.googleapis.com/v1beta"
                />
                <PreferenceField
                    pref_key=PREF_TIMEOUT_SECS
                    label="Request Timeout (seconds)"
                    placeholder="120"
                />
            </section>
        </div>
    }
}
