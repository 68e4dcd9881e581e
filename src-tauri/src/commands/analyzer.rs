//! Tauri commands for friction analysis.
//!
//! `analyze_files` runs the whole pipeline:
//! 1. Validates and encodes the uploaded files (session untouched on failure)
//! 2. Resolves the API key and client settings
//! 3. Calls Gemini and commits the result to the session

use tauri::State;
use tracing::{info, warn};

use crate::analyzer::GeminiClient;
use crate::commands::config::load_client_settings;
use crate::commands::keychain::resolve_gemini_key;
use crate::config::{analysis_config_path, resolve_analysis_config};
use crate::encoder::{encode_batch, FilePayload};
use crate::error::AnalysisError;
use crate::session::{SessionHandle, SessionSnapshot};

/// Analyze one batch of files and return the resulting session.
///
/// Returns `Err` only for problems that leave the session unchanged (size
/// limit, unreadable payload, a start outside Idle). Service failures come
/// back as an `Ok` snapshot in the `error` state.
#[tauri::command]
pub async fn analyze_files(
    app: tauri::AppHandle,
    session: State<'_, SessionHandle>,
    files: Vec<FilePayload>,
) -> Result<SessionSnapshot, String> {
    info!("Starting analysis of {} file(s)", files.len());
    session.ensure_can_begin()?;

    let client = match build_client(&app) {
        Ok(client) => client,
        Err(err) => {
            // Still validate the upload so size problems win over config problems.
            let encoded = encode_batch(files).await?;
            warn!("Cannot reach the reasoning service: {}", err);
            return Ok(session.fail_before_request(encoded, err)?);
        }
    };

    info!(
        "Using model '{}' at {}",
        client.settings().model,
        client.settings().base_url
    );

    let (config, override_path) = resolve_analysis_config(analysis_config_path().as_deref());
    if let Some(path) = override_path {
        info!("Using analysis prompts from {:?}", path);
    }

    let snapshot = session
        .analyze(&client, &config, files)
        .await?;

    info!(
        "Analysis generation {} finished with status {}",
        snapshot.generation, snapshot.status
    );
    Ok(snapshot)
}

#[tauri::command]
pub fn get_session(session: State<'_, SessionHandle>) -> SessionSnapshot {
    session.snapshot()
}

#[tauri::command]
pub fn reset_session(session: State<'_, SessionHandle>) -> SessionSnapshot {
    session.reset()
}

/// A Gemini client from the stored key and preferences.
///
/// Missing credentials surface as `TransportFailure`: the request cannot be
/// authenticated.
fn build_client(app: &tauri::AppHandle) -> Result<GeminiClient, AnalysisError> {
    let (api_key, source) = resolve_gemini_key()
        .map_err(|e| AnalysisError::TransportFailure(e.to_string()))?
        .ok_or_else(|| {
            AnalysisError::TransportFailure(
                "No Gemini API key configured. Please set it in Settings.".to_string(),
            )
        })?;
    info!("Using Gemini API key from {:?}", source);

    let settings =
        load_client_settings(app).map_err(|e| AnalysisError::TransportFailure(e.to_string()))?;
    GeminiClient::new(api_key, settings)
}
