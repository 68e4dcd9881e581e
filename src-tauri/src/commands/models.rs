use serde::{Deserialize, Serialize};
use tauri::AppHandle;
use tracing::{info, warn};

use crate::commands::config::load_client_settings;
use crate::commands::keychain::resolve_gemini_key;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Models usable for analysis, i.e. those supporting `generateContent`.
fn usable_models(response: ModelsResponse) -> Vec<ModelInfo> {
    let mut result: Vec<ModelInfo> = response
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|m| {
            let id = m.name.trim_start_matches("models/").to_string();
            let name = m.display_name.unwrap_or_else(|| id.clone());
            ModelInfo { id, name }
        })
        .collect();

    result.sort_by(|a, b| a.id.cmp(&b.id));
    result
}

#[tauri::command]
pub async fn list_models(app: AppHandle) -> Result<Vec<ModelInfo>, String> {
    info!("Fetching Gemini models");
    let (api_key, _) = resolve_gemini_key()?
        .ok_or_else(|| "No Gemini API key configured. Set it above first.".to_string())?;
    let settings = load_client_settings(&app)?;

    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let resp = client
        .get(format!("{}/models", settings.base_url))
        .query(&[("pageSize", "1000")])
        .header("x-goog-api-key", &api_key)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        warn!("Models API error ({}): {}", status, body);
        return Err(format!("API error ({})", status));
    }

    let models: ModelsResponse = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    let result = usable_models(models);
    info!("Found {} Gemini models", result.len());
    Ok(result)
}
