//! Photo Directory Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{is_image_file, PhotoDirectory},
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based photo directory scanner
///
/// Lists `.jpg`/`.jpeg` files directly inside a directory using `tokio::fs`.
/// Entries are returned sorted by path so every run over the same directory
/// sees the same enumeration order.
#[derive(Debug, Clone, Default)]
pub struct TokioPhotoDirectory;

impl TokioPhotoDirectory {
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl PhotoDirectory for TokioPhotoDirectory {
    async fn is_directory(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn list_image_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(Self::map_io_error)?
        {
            let file_type = entry.file_type().await.map_err(Self::map_io_error)?;
            let entry_path = entry.path();
            if file_type.is_file() && is_image_file(&entry_path) {
                files.push(entry_path);
            }
        }

        files.sort();
        debug!(path = ?path, count = files.len(), "Listed image files");
        Ok(files)
    }

    async fn resolve_directory(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).await.map_err(Self::map_io_error)
    }
}
