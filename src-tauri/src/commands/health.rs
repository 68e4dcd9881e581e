use serde::Serialize;
use tauri::AppHandle;
use tracing::{info, warn};

use crate::commands::config::load_client_settings;
use crate::commands::keychain::{resolve_gemini_key, KeySource};
use crate::config::{analysis_config_path, resolve_analysis_config};

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub api_key_set: bool,
    /// "keychain", the environment variable name, or None
    pub api_key_source: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub settings_error: Option<String>,
    pub analysis_config_path: Option<String>,
    pub analysis_config_overridden: bool,
}

#[tauri::command]
pub fn run_health_check(app: AppHandle) -> Result<HealthReport, String> {
    info!("Running health check");

    let key_source = match resolve_gemini_key() {
        Ok(found) => found.map(|(_, source)| source),
        Err(e) => {
            warn!("Keychain lookup failed during health check: {}", e);
            None
        }
    };
    let api_key_source = key_source.map(|source| match source {
        KeySource::Keychain => "keychain".to_string(),
        KeySource::Env(var) => var.to_string(),
    });
    info!("Gemini API key available: {:?}", api_key_source);

    let (model, api_base_url, settings_error) = match load_client_settings(&app) {
        Ok(settings) => (Some(settings.model), Some(settings.base_url), None),
        Err(e) => (None, None, Some(e.to_string())),
    };

    let config_path = analysis_config_path();
    let (_, applied) = resolve_analysis_config(config_path.as_deref());
    info!("Analysis config override in effect: {}", applied.is_some());

    Ok(HealthReport {
        api_key_set: api_key_source.is_some(),
        api_key_source,
        model,
        api_base_url,
        settings_error,
        analysis_config_path: config_path.map(|p| p.to_string_lossy().to_string()),
        analysis_config_overridden: applied.is_some(),
    })
}
