use keyring::Entry;
use tracing::{info, warn};

use crate::config::api_key_from_env;
use crate::error::NeuroLensError;

/// Keychain account all NeuroLens secrets are stored under.
const KEYRING_USER: &str = "neurolens";

/// Keychain service for the Gemini API key.
pub const GEMINI_SERVICE: &str = "neurolens-gemini-api";

const KNOWN_SERVICES: [&str; 1] = [GEMINI_SERVICE];

/// Where the active API key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Keychain,
    Env(&'static str),
}

fn entry(service: &str) -> Result<Entry, NeuroLensError> {
    if !KNOWN_SERVICES.contains(&service) {
        return Err(NeuroLensError::Keychain(format!(
            "Unknown keychain service '{}'",
            service
        )));
    }
    Entry::new(service, KEYRING_USER).map_err(|e| {
        warn!("Failed to create keyring entry for {}: {}", service, e);
        NeuroLensError::Keychain(e.to_string())
    })
}

/// Stored key for `service`, `None` if nothing is stored.
pub fn read_stored_key(service: &str) -> Result<Option<String>, NeuroLensError> {
    match entry(service)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => {
            warn!("Failed to read password for {}: {}", service, e);
            Err(NeuroLensError::Keychain(e.to_string()))
        }
    }
}

/// The Gemini key from the keychain, or from the environment as a fallback.
pub fn resolve_gemini_key() -> Result<Option<(String, KeySource)>, NeuroLensError> {
    if let Some(key) = read_stored_key(GEMINI_SERVICE)?.filter(|k| !k.trim().is_empty()) {
        return Ok(Some((key, KeySource::Keychain)));
    }
    Ok(api_key_from_env().map(|(var, key)| (key, KeySource::Env(var))))
}

#[tauri::command]
pub fn set_api_key(service: &str, key: &str) -> Result<(), String> {
    info!("Setting API key for service: {}", service);
    let key = key.trim();
    if key.is_empty() {
        return Err(NeuroLensError::Keychain("API key must not be empty".to_string()).into());
    }
    entry(service)?.set_password(key).map_err(|e| {
        warn!("Failed to set password for {}: {}", service, e);
        e.to_string()
    })
}

/// Reports only whether a key is stored; the secret never leaves the backend.
#[tauri::command]
pub fn get_api_key(service: &str) -> Result<Option<String>, String> {
    info!("Checking API key for service: {}", service);
    let stored = read_stored_key(service)?;
    Ok(stored.map(|key| mask_key(&key)))
}

#[tauri::command]
pub fn delete_api_key(service: &str) -> Result<(), String> {
    info!("Deleting API key for service: {}", service);
    match entry(service)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => {
            warn!("Failed to delete credential for {}: {}", service, e);
            Err(e.to_string())
        }
    }
}

/// `AIza...wxyz`-style hint of a stored key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
