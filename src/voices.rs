//! Directory-backed store of voice-reference WAV files used as cloning
//! prompts. Filenames are sanitized to a restricted character set so client
//! input can never escape the store directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::AppError;

lazy_static! {
    // Word characters, hyphen and dot survive; everything else becomes '_'.
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^\w\-\.]").unwrap();
}

/// Replace every character outside `[\w\-.]` with an underscore.
/// Idempotent: sanitizing a sanitized name is a no-op.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceReference {
    pub filename: String,
    pub path: String,
    pub size_bytes: u64,
    pub modified_timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct VoiceStore {
    dir: PathBuf,
}

impl VoiceStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Resolve a client-supplied name to a path inside the store.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.dir.join(sanitize_filename(name))
    }

    /// List all `.wav` entries with size and modification time.
    pub fn list(&self) -> Result<Vec<VoiceReference>, AppError> {
        fs::create_dir_all(&self.dir)?;

        let mut references = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let filename = entry.file_name().to_string_lossy().to_string();

            if !filename.to_lowercase().ends_with(".wav") || !path.is_file() {
                continue;
            }

            let metadata = entry.metadata()?;
            let modified_timestamp = metadata
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);

            references.push(VoiceReference {
                filename,
                path: path.to_string_lossy().to_string(),
                size_bytes: metadata.len(),
                modified_timestamp,
            });
        }

        Ok(references)
    }

    /// Store an uploaded WAV file under its sanitized name.
    ///
    /// Rejects non-`.wav` names before anything touches the disk. A failed
    /// write removes whatever partial file it left behind.
    pub fn upload(&self, name: &str, bytes: &[u8]) -> Result<VoiceReference, AppError> {
        if !name.to_lowercase().ends_with(".wav") {
            return Err(AppError::BadRequest(
                "Only WAV files are supported. Please upload a .wav file.".to_string(),
            ));
        }

        fs::create_dir_all(&self.dir)?;

        let filename = sanitize_filename(name);
        let path = self.dir.join(&filename);

        if let Err(e) = fs::write(&path, bytes) {
            if path.exists() {
                let _ = fs::remove_file(&path);
            }
            return Err(e.into());
        }

        let metadata = fs::metadata(&path)?;
        let modified_timestamp = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        tracing::info!(
            "Voice reference uploaded: {} ({} bytes)",
            filename,
            metadata.len()
        );

        Ok(VoiceReference {
            filename,
            path: path.to_string_lossy().to_string(),
            size_bytes: metadata.len(),
            modified_timestamp,
        })
    }

    /// Delete a voice reference by (sanitized) name.
    pub fn delete(&self, name: &str) -> Result<String, AppError> {
        let filename = sanitize_filename(name);
        let path = self.dir.join(&filename);

        if !path.exists() {
            return Err(AppError::VoiceReferenceNotFound(filename));
        }

        if !path.is_file() {
            return Err(AppError::BadRequest(format!("'{}' is not a file", filename)));
        }

        fs::remove_file(&path)?;
        tracing::info!("Voice reference deleted: {}", filename);

        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, VoiceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VoiceStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_filename("my voice!.wav"), "my_voice_.wav");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_filename("weird name (2).wav");
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn test_upload_then_list_reports_exact_size() {
        let (_dir, store) = store();
        let bytes = vec![0u8; 321];
        let uploaded = store.upload("sample.wav", &bytes).unwrap();
        assert_eq!(uploaded.size_bytes, 321);

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "sample.wav");
        assert_eq!(listed[0].size_bytes, 321);
    }

    #[test]
    fn test_upload_sanitizes_filename() {
        let (_dir, store) = store();
        let uploaded = store.upload("my voice!.wav", b"abc").unwrap();
        assert_eq!(uploaded.filename, "my_voice_.wav");
    }

    #[test]
    fn test_upload_rejects_non_wav() {
        let (_dir, store) = store();
        let result = store.upload("clip.mp3", b"abc");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_dir, store) = store();
        let result = store.delete("ghost.wav");
        assert!(matches!(result, Err(AppError::VoiceReferenceNotFound(_))));
    }

    #[test]
    fn test_delete_after_upload_succeeds_once() {
        let (_dir, store) = store();
        store.upload("once.wav", b"abc").unwrap();
        assert!(store.delete("once.wav").is_ok());
        assert!(matches!(
            store.delete("once.wav"),
            Err(AppError::VoiceReferenceNotFound(_))
        ));
    }

    #[test]
    fn test_delete_directory_is_bad_request() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.resolve("nested.wav")).unwrap();
        let result = store.delete("nested.wav");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_list_skips_non_wav_entries() {
        let (_dir, store) = store();
        store.upload("keep.wav", b"abc").unwrap();
        std::fs::write(store.directory().join("skip.txt"), b"xyz").unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "keep.wav");
    }
}
