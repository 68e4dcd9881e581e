use tauri::AppHandle;
use tauri_plugin_store::StoreExt;
use tracing::{info, warn};

use crate::analyzer::ClientSettings;
use crate::config::{
    check_known_preference, client_settings_from, validate_preference, PREFERENCES_STORE,
};
use crate::error::NeuroLensError;

/// Read one string preference from the store.
pub fn read_preference(app: &AppHandle, key: &str) -> Result<Option<String>, NeuroLensError> {
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        NeuroLensError::Config(e.to_string())
    })?;
    Ok(store.get(key).and_then(|v| v.as_str().map(|s| s.to_string())))
}

/// Client settings assembled from the stored preferences.
pub fn load_client_settings(app: &AppHandle) -> Result<ClientSettings, NeuroLensError> {
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        NeuroLensError::Config(e.to_string())
    })?;
    client_settings_from(|key| store.get(key).and_then(|v| v.as_str().map(|s| s.to_string())))
}

#[tauri::command]
pub fn get_preference(app: AppHandle, key: &str) -> Result<Option<String>, String> {
    info!("Getting preference: {}", key);
    Ok(read_preference(&app, key)?)
}

/// Only known keys are accepted; an empty value removes the preference.
#[tauri::command]
pub fn set_preference(app: AppHandle, key: &str, value: &str) -> Result<(), String> {
    info!("Setting preference: {} = {}", key, value);
    check_known_preference(key)?;
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        e.to_string()
    })?;

    if value.trim().is_empty() {
        store.delete(key);
    } else {
        validate_preference(key, value)?;
        store.set(key, serde_json::json!(value.trim()));
    }

    store.save().map_err(|e| {
        warn!("Failed to save store: {}", e);
        e.to_string()
    })
}
