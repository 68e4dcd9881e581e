use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;
}

/// Keychain service holding the Gemini API key.
pub const GEMINI_KEY_SERVICE: &str = "neurolens-gemini-api";

// -- Arg structs for serialization --

#[derive(Serialize)]
struct ServiceArgs<'a> {
    service: &'a str,
}

#[derive(Serialize)]
struct SetApiKeyArgs<'a> {
    service: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct GetPreferenceArgs<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct SetPreferenceArgs<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct AnalyzeFilesArgs<'a> {
    files: &'a [FilePayload],
}

// -- Types matching backend structs --

/// One selected file, read and base64-encoded in the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePayload {
    pub name: String,
    pub size: u64,
    pub media_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Analyzing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub media_type: String,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisReport {
    pub detected_task: String,
    pub friction_point: String,
    pub solution: String,
    pub action_output: String,
    pub reason_map: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub status: SessionStatus,
    pub files: Vec<FileSummary>,
    pub report: Option<AnalysisReport>,
    pub error: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthReport {
    pub api_key_set: bool,
    pub api_key_source: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub settings_error: Option<String>,
    pub analysis_config_path: Option<String>,
    pub analysis_config_overridden: bool,
}

// -- Typed invoke helpers --

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| "Unknown error".to_string())
}

async fn call<A: Serialize, T: DeserializeOwned>(cmd: &str, args: &A) -> Result<T, String> {
    let args = serde_wasm_bindgen::to_value(args).map_err(|e| e.to_string())?;
    let result = invoke(cmd, args).await.map_err(js_error)?;
    serde_wasm_bindgen::from_value(result).map_err(|e| e.to_string())
}

async fn call_unit<A: Serialize>(cmd: &str, args: &A) -> Result<(), String> {
    let args = serde_wasm_bindgen::to_value(args).map_err(|e| e.to_string())?;
    invoke(cmd, args).await.map(|_| ()).map_err(js_error)
}

pub async fn analyze_files(files: &[FilePayload]) -> Result<SessionSnapshot, String> {
    call("analyze_files", &AnalyzeFilesArgs { files }).await
}

pub async fn get_session() -> Result<SessionSnapshot, String> {
    call("get_session", &serde_json::json!({})).await
}

pub async fn reset_session() -> Result<SessionSnapshot, String> {
    call("reset_session", &serde_json::json!({})).await
}

pub async fn set_api_key(service: &str, key: &str) -> Result<(), String> {
    call_unit("set_api_key", &SetApiKeyArgs { service, key }).await
}

/// Masked hint of the stored key, if any.
pub async fn get_api_key(service: &str) -> Result<Option<String>, String> {
    call("get_api_key", &ServiceArgs { service }).await
}

pub async fn delete_api_key(service: &str) -> Result<(), String> {
    call_unit("delete_api_key", &ServiceArgs { service }).await
}

pub async fn get_preference(key: &str) -> Result<Option<String>, String> {
    call("get_preference", &GetPreferenceArgs { key }).await
}

pub async fn set_preference(key: &str, value: &str) -> Result<(), String> {
    call_unit("set_preference", &SetPreferenceArgs { key, value }).await
}

pub async fn run_health_check() -> Result<HealthReport, String> {
    call("run_health_check", &serde_json::json!({})).await
}

pub async fn list_models() -> Result<Vec<ModelInfo>, String> {
    call("list_models", &serde_json::json!({})).await
}
