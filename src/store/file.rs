//! File-backed checkpoint store
//!
//! Provides file-based persistence with atomic writes. Each key maps to
//! one JSON file whose name is the URL-safe base64 of the key.

use super::types::CheckpointStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Suffix source for temp files, so concurrent writers never share one
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Checkpoint store keeping one file per kind under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory holding the state files
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", URL_SAFE_NO_PAD.encode(key.as_bytes())))
    }
}

/// Unique sibling of `path` that a single write stages into
fn temp_path_for(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("{}.{n}.tmp", std::process::id()))
}

#[async_trait]
impl CheckpointStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::store(format!("Failed to read state file: {e}"))),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::store(format!("Failed to create state directory: {e}")))?;

        // Write to temp file first, then rename for atomicity
        let path = self.path_for(key);
        let temp_path = temp_path_for(&path);
        tokio::fs::write(&temp_path, value.as_bytes())
            .await
            .map_err(|e| Error::store(format!("Failed to write state file: {e}")))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(Error::store(format!("Failed to rename state file: {e}")));
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::store(format!("Failed to remove state file: {e}"))),
        }
    }
}
