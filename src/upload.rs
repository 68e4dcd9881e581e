//! Reading user-selected files into request payloads.
//!
//! Sizes are checked against the 10 MiB ceiling before any bytes are read,
//! so an oversized selection never touches memory or the backend.

use base64::{engine::general_purpose::STANDARD, Engine};
use futures::future::try_join_all;
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::commands::{FilePayload, FileSummary};

/// Per-file ceiling, mirrored from the backend encoder.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// `accept` list for the file picker.
pub const ACCEPTED_TYPES: &str = "image/*,application/pdf,text/*,.csv,.json,.xml";

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

pub fn check_size(name: &str, size: u64) -> Result<(), String> {
    if size > MAX_FILE_BYTES {
        return Err(format!(
            "File size exceeds limit (10MB): '{}' is {}.",
            name,
            format_size(size)
        ));
    }
    Ok(())
}

/// Human-readable size, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Browser-reported type, `None` when the browser could not tell.
pub fn declared_type(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_ascii_lowercase())
}

/// What the UI shows for a payload while the backend is still working.
pub fn summarize(payload: &FilePayload) -> FileSummary {
    let media_type = payload
        .media_type
        .clone()
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
    let preview = media_type
        .starts_with("image/")
        .then(|| format!("data:{};base64,{}", media_type, payload.data));
    FileSummary {
        name: payload.name.clone(),
        size: payload.size,
        media_type,
        preview,
    }
}

pub fn total_size(files: &[FileSummary]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

/// Collect a `FileList` into owned handles.
pub fn files_from_list(list: &web_sys::FileList) -> Vec<web_sys::File> {
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

async fn read_file(file: web_sys::File) -> Result<FilePayload, String> {
    let name = file.name();
    let array_buffer: ArrayBuffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("Failed to read '{}': {:?}", name, e))?
        .dyn_into()
        .map_err(|_| format!("Failed to read '{}': not an ArrayBuffer", name))?;

    let bytes = Uint8Array::new(&array_buffer).to_vec();
    Ok(FilePayload {
        size: bytes.len() as u64,
        media_type: declared_type(&file.type_()),
        data: STANDARD.encode(&bytes),
        name,
    })
}

/// Read a whole selection. Every size is checked before any file is read;
/// reads then run concurrently and the payloads keep selection order.
pub async fn read_files(files: Vec<web_sys::File>) -> Result<Vec<FilePayload>, String> {
    if files.is_empty() {
        return Err("No files selected.".to_string());
    }
    for file in &files {
        check_size(&file.name(), file.size() as u64)?;
    }
    let payloads = try_join_all(files.into_iter().map(read_file)).await?;
    for payload in &payloads {
        check_size(&payload.name, payload.size)?;
    }
    Ok(payloads)
}
