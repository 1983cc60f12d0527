// src/services/upload_services.rs
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "mp4", "avi", "mkv", "mov"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lowercased last extension of `filename`, if any.
fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Collision-resistant name for a stored upload: `<uuid>_<stem>.<ext>`.
/// Directory components are dropped and the stem keeps only `[A-Za-z0-9_-]`.
pub fn stored_name(original: &str) -> Result<String, UploadError> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = base
        .rsplit_once('.')
        .ok_or_else(|| UploadError::InvalidUpload(format!("'{}' has no extension", original)))?;

    let stem: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let id = Uuid::new_v4().simple();
    let ext = ext.to_ascii_lowercase();

    Ok(if stem.is_empty() {
        format!("{}.{}", id, ext)
    } else {
        format!("{}_{}.{}", id, stem, ext)
    })
}

/// Decode a base64 payload, with or without a `data:<mime>;base64,` prefix.
pub fn decode_upload(data: &str) -> Result<Vec<u8>, UploadError> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| UploadError::InvalidUpload(format!("bad base64 data: {}", e)))
}

/// Validate and write an upload under `dir`. Returns the stored file name,
/// which is what posts keep as their media reference.
pub async fn store_upload(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
    if !allowed_file(original_name) {
        warn!("rejected upload '{}'", original_name);
        return Err(UploadError::InvalidUpload(format!(
            "'{}' is not an allowed file type ({})",
            original_name,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let name = stored_name(original_name)?;
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&name), bytes).await?;
    debug!("stored upload '{}' as '{}' ({} bytes)", original_name, name, bytes.len());
    Ok(name)
}

/// Best-effort removal of a stored upload whose post could not be saved.
pub async fn discard_upload(dir: &Path, name: &str) {
    let path: PathBuf = dir.join(name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("failed to remove orphaned upload {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        for name in ["a.jpg", "a.JPEG", "clip.Mp4", "x.y.mov", "b.gif", "c.avi", "d.mkv", "e.png"] {
            assert!(allowed_file(name), "{} should be allowed", name);
        }
        for name in ["a.exe", "jpg", "noext", "a.jpg.sh", "a."] {
            assert!(!allowed_file(name), "{} should be rejected", name);
        }
    }

    #[test]
    fn stored_names_differ_for_same_input() {
        let a = stored_name("cat.png").unwrap();
        let b = stored_name("cat.png").unwrap();
        assert_ne!(a, b);
        assert!(a.ends_with("_cat.png"));
    }

    #[test]
    fn stored_name_strips_paths_and_symbols() {
        let name = stored_name("../../etc/my pic!.JPG").unwrap();
        assert!(name.ends_with("_my_pic.jpg"), "{}", name);
        assert!(!name.contains('/'));

        let bare = stored_name("C:\\tmp\\###.gif").unwrap();
        assert!(!bare.contains('_'));
        assert!(bare.ends_with(".gif"));
    }

    #[test]
    fn decodes_with_and_without_data_url_prefix() {
        assert_eq!(decode_upload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_upload("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(matches!(decode_upload("%%%"), Err(UploadError::InvalidUpload(_))));
    }

    #[tokio::test]
    async fn store_writes_allowed_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");

        let name = store_upload(&target, "photo.jpg", b"bytes").await.unwrap();
        let written = tokio::fs::read(target.join(&name)).await.unwrap();
        assert_eq!(written, b"bytes");

        discard_upload(&target, &name).await;
        assert!(!target.join(&name).exists());
    }

    #[tokio::test]
    async fn store_rejects_disallowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_upload(dir.path(), "script.sh", b"#!/bin/sh").await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidUpload(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
