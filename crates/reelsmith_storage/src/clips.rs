//! Filesystem clip storage.
//!
//! Clips are stored by content hash, so a payload fetched twice (for example
//! after a crash between download and bookkeeping) lands on the same file.

use async_trait::async_trait;
use reelsmith_core::StoredMedia;
use reelsmith_error::{ReelsmithResult, StorageError, StorageErrorKind};
use reelsmith_interface::ClipStorage;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Content-addressable clip storage on the local filesystem.
///
/// Layout: `{base_path}/{kind}/{hash[0:2]}/{hash[2:4]}/{hash}.{ext}`
///
/// ```text
/// .reelsmith/clips/
/// ├── video/
/// │   └── 3f/
/// │       └── a2/
/// │           └── 3fa2...e91.mp4
/// └── audio/
///     └── 08/
///         └── 1c/
///             └── 081c...77d.mp3
/// ```
///
/// Writes go to a uniquely named temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSystemClipStorage {
    base_path: PathBuf,
}

impl FileSystemClipStorage {
    /// Creates the storage, creating its base directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> ReelsmithResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %base_path.display(), "Opened clip storage");
        Ok(Self { base_path })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// SHA-256 of data as lowercase hex.
    pub fn checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, hash: &str, mime_type: &str) -> PathBuf {
        let (kind, ext) = layout_for(mime_type);
        self.base_path
            .join(kind)
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(format!("{}.{}", hash, ext))
    }
}

/// Directory and file extension for a MIME type.
fn layout_for(mime_type: &str) -> (&'static str, &'static str) {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "video/mp4" => ("video", "mp4"),
        "video/webm" => ("video", "webm"),
        "video/quicktime" => ("video", "mov"),
        "audio/mpeg" | "audio/mp3" => ("audio", "mp3"),
        "audio/wav" | "audio/x-wav" => ("audio", "wav"),
        "audio/aac" => ("audio", "aac"),
        other if other.starts_with("video/") => ("video", "bin"),
        other if other.starts_with("audio/") => ("audio", "bin"),
        _ => ("other", "bin"),
    }
}

#[async_trait]
impl ClipStorage for FileSystemClipStorage {
    #[tracing::instrument(skip(self, data), fields(size = data.len(), mime_type = %mime_type))]
    async fn store(&self, data: &[u8], mime_type: &str) -> ReelsmithResult<StoredMedia> {
        let hash = Self::checksum(data);
        let path = self.path_for(&hash, mime_type);
        let stored = StoredMedia {
            locator: path.to_string_lossy().to_string(),
            checksum: hash.clone(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.to_string(),
        };

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(hash = %hash, path = %path.display(), "Clip already stored");
            return Ok(stored);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(hash = %hash, path = %path.display(), size = data.len(), "Stored clip");
        Ok(stored)
    }

    #[tracing::instrument(skip(self, media), fields(locator = %media.locator))]
    async fn retrieve(&self, media: &StoredMedia) -> ReelsmithResult<Vec<u8>> {
        let data = tokio::fs::read(&media.locator).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(media.locator.clone()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", media.locator, e)))
            }
        })?;

        let actual = Self::checksum(&data);
        if actual != media.checksum {
            return Err(StorageError::new(StorageErrorKind::ChecksumMismatch {
                locator: media.locator.clone(),
                expected: media.checksum.clone(),
                actual,
            })
            .into());
        }
        Ok(data)
    }

    async fn resolve(&self, locator: &str) -> ReelsmithResult<PathBuf> {
        let path = PathBuf::from(locator);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(path)
        } else {
            Err(StorageError::new(StorageErrorKind::NotFound(locator.to_string())).into())
        }
    }
}
