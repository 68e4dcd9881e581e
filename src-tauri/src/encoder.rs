//! File encoding for the analysis request.
//!
//! The remote service speaks JSON, so every uploaded file travels as a
//! standard base64 payload tagged with its media type. Files above
//! [`MAX_FILE_BYTES`] are rejected before any decoding or encoding work.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AnalysisError;

/// Hard ceiling per file (10 MiB).
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Media type used when the browser did not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// A file as sent by the front-end: browser-reported metadata plus base64 bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    pub data: String,
}

/// An accepted, transport-ready file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFile {
    pub name: String,
    pub size: u64,
    pub media_type: String,
    /// Standard base64 of the file bytes.
    pub data: String,
    /// `data:` URL for image files, absent otherwise.
    pub preview: Option<String>,
}

impl EncodedFile {
    pub fn is_image(&self) -> bool {
        is_image_type(&self.media_type)
    }
}

/// Reject files above the ceiling.
pub fn check_size(name: &str, size: u64) -> Result<(), AnalysisError> {
    if size > MAX_FILE_BYTES {
        warn!("Rejecting '{}': {} bytes exceeds {} byte limit", name, size, MAX_FILE_BYTES);
        return Err(AnalysisError::SizeLimitExceeded {
            name: name.to_string(),
            size,
        });
    }
    Ok(())
}

/// Declared media type if present, otherwise the generic binary type.
pub fn resolve_media_type(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

pub fn is_image_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Encode raw bytes into an [`EncodedFile`].
pub fn encode_bytes(
    name: &str,
    declared_type: Option<&str>,
    bytes: &[u8],
) -> Result<EncodedFile, AnalysisError> {
    let size = bytes.len() as u64;
    check_size(name, size)?;

    let media_type = resolve_media_type(declared_type);
    let data = STANDARD.encode(bytes);
    let preview = is_image_type(&media_type).then(|| format!("data:{};base64,{}", media_type, data));

    debug!("Encoded '{}' ({}, {} bytes)", name, media_type, size);

    Ok(EncodedFile {
        name: name.to_string(),
        size,
        media_type,
        data,
        preview,
    })
}

/// Validate a front-end payload and turn it into an [`EncodedFile`].
///
/// The browser-reported size is checked first so oversized files are never
/// decoded; the decoded length is checked again because the front-end is not
/// trusted to report it honestly.
pub fn decode_payload(payload: &FilePayload) -> Result<EncodedFile, AnalysisError> {
    check_size(&payload.name, payload.size)?;

    // base64 expands by 4/3, so anything longer cannot decode under the ceiling
    let max_encoded_len = (MAX_FILE_BYTES as usize).div_ceil(3) * 4;
    if payload.data.len() > max_encoded_len {
        return Err(AnalysisError::SizeLimitExceeded {
            name: payload.name.clone(),
            size: (payload.data.len() / 4 * 3) as u64,
        });
    }

    let bytes = STANDARD
        .decode(payload.data.trim())
        .map_err(|e| AnalysisError::InvalidPayload {
            name: payload.name.clone(),
            reason: format!("invalid base64 data ({})", e),
        })?;

    encode_bytes(&payload.name, payload.media_type.as_deref(), &bytes)
}

/// Encode a whole selection. Every file must pass, otherwise the batch fails
/// and nothing is returned.
///
/// Sizes are checked up front for the entire batch; the decode/encode work
/// then runs concurrently on the blocking pool, one task per file, and the
/// results are collected in selection order.
pub async fn encode_batch(payloads: Vec<FilePayload>) -> Result<Vec<EncodedFile>, AnalysisError> {
    if payloads.is_empty() {
        return Err(AnalysisError::NoFiles);
    }

    for payload in &payloads {
        check_size(&payload.name, payload.size)?;
    }

    let handles: Vec<_> = payloads
        .into_iter()
        .map(|payload| {
            let name = payload.name.clone();
            let handle = tokio::task::spawn_blocking(move || decode_payload(&payload));
            (name, handle)
        })
        .collect();

    let mut files = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let file = handle.await.map_err(|e| AnalysisError::InvalidPayload {
            name,
            reason: format!("encoding task failed ({})", e),
        })??;
        files.push(file);
    }

    info!(
        "Encoded batch of {} file(s), {} bytes total",
        files.len(),
        files.iter().map(|f| f.size).sum::<u64>()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, media_type: Option<&str>, bytes: &[u8]) -> FilePayload {
        FilePayload {
            name: name.to_string(),
            size: bytes.len() as u64,
            media_type: media_type.map(str::to_string),
            data: STANDARD.encode(bytes),
        }
    }

    #[test]
    fn test_check_size_at_limit_is_accepted() {
        assert!(check_size("a.bin", MAX_FILE_BYTES).is_ok());
    }

    #[test]
    fn test_check_size_over_limit_is_rejected() {
        let err = check_size("big.bin", MAX_FILE_BYTES + 1).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::SizeLimitExceeded {
                name: "big.bin".to_string(),
                size: MAX_FILE_BYTES + 1
            }
        );
    }

    #[test]
    fn test_resolve_media_type_defaults() {
        assert_eq!(resolve_media_type(None), DEFAULT_MEDIA_TYPE);
        assert_eq!(resolve_media_type(Some("")), DEFAULT_MEDIA_TYPE);
        assert_eq!(resolve_media_type(Some("   ")), DEFAULT_MEDIA_TYPE);
        assert_eq!(resolve_media_type(Some("text/plain")), "text/plain");
        assert_eq!(resolve_media_type(Some("Image/PNG")), "image/png");
    }

    #[test]
    fn test_encode_bytes_text_has_no_preview() {
        let file = encode_bytes("notes.txt", Some("text/plain"), b"hello world").unwrap();
        assert_eq!(file.media_type, "text/plain");
        assert_eq!(file.size, 11);
        assert_eq!(file.data, "aGVsbG8gd29ybGQ=");
        assert!(file.preview.is_none());
        assert!(!file.is_image());
    }

    #[test]
    fn test_encode_bytes_image_has_data_url_preview() {
        let bytes = [0x89, b'P', b'N', b'G'];
        let file = encode_bytes("shot.png", Some("image/png"), &bytes).unwrap();
        let preview = file.preview.as_deref().unwrap();
        assert!(preview.starts_with("data:image/png;base64,"));
        assert!(preview.ends_with(&file.data));
    }

    #[test]
    fn test_encode_bytes_without_type_is_binary() {
        let file = encode_bytes("blob", None, &[1, 2, 3]).unwrap();
        assert_eq!(file.media_type, DEFAULT_MEDIA_TYPE);
        assert!(file.preview.is_none());
    }

    #[test]
    fn test_decode_payload_rejects_bad_base64() {
        let p = FilePayload {
            name: "x.txt".to_string(),
            size: 3,
            media_type: Some("text/plain".to_string()),
            data: "not base64!!".to_string(),
        };
        match decode_payload(&p) {
            Err(AnalysisError::InvalidPayload { name, reason }) => {
                assert_eq!(name, "x.txt");
                assert!(reason.contains("base64"));
            }
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_payload_trusts_decoded_length_not_declared_size() {
        let bytes = vec![b'a'; 64];
        let mut p = payload("a.txt", Some("text/plain"), &bytes);
        p.size = 1;
        let file = decode_payload(&p).unwrap();
        assert_eq!(file.size, 64);
    }

    #[test]
    fn test_decode_payload_rejects_declared_oversize_without_decoding() {
        let p = FilePayload {
            name: "huge.iso".to_string(),
            size: 15 * 1024 * 1024,
            media_type: None,
            // garbage data proves no decode is attempted
            data: "@@@".to_string(),
        };
        assert!(matches!(
            decode_payload(&p),
            Err(AnalysisError::SizeLimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_encode_batch_preserves_order() {
        let batch = vec![
            payload("one.txt", Some("text/plain"), b"1"),
            payload("two.json", Some("application/json"), b"{}"),
            payload("three.png", Some("image/png"), &[0x89, b'P']),
        ];
        let files = encode_batch(batch).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["one.txt", "two.json", "three.png"]);
        assert!(files[2].preview.is_some());
    }

    #[tokio::test]
    async fn test_encode_batch_empty_is_rejected() {
        assert_eq!(encode_batch(vec![]).await.unwrap_err(), AnalysisError::NoFiles);
    }

    #[tokio::test]
    async fn test_encode_batch_fails_whole_batch_on_one_oversize() {
        let mut big = payload("big.bin", None, b"x");
        big.size = MAX_FILE_BYTES + 1;
        let batch = vec![payload("ok.txt", Some("text/plain"), b"fine"), big];
        match encode_batch(batch).await {
            Err(AnalysisError::SizeLimitExceeded { name, .. }) => assert_eq!(name, "big.bin"),
            other => panic!("expected SizeLimitExceeded, got {:?}", other),
        }
    }
}
