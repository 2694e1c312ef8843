//! Local Storage Abstractions
//!
//! Read-only view of the local directory a photoset is uploaded from.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// File extensions accepted as photos, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Returns true if the path carries one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Lexically fold `.` and `..` components out of `path`.
///
/// No filesystem access; symlinks are not followed. `..` at the root stays
/// at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.file_name().is_some() {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Photo directory trait
///
/// Abstracts directory enumeration so the upload workflow can run against
/// the real filesystem on desktop and an in-memory listing in tests.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::PhotoDirectory;
///
/// async fn count_photos(dir: &dyn PhotoDirectory, path: &Path) -> Result<usize> {
///     Ok(dir.list_image_files(path).await?.len())
/// }
/// ```
#[async_trait]
pub trait PhotoDirectory: Send + Sync {
    /// Check whether the path exists and is a directory
    async fn is_directory(&self, path: &Path) -> Result<bool>;

    /// List image files directly inside `path`
    ///
    /// Only `.jpg`/`.jpeg` files (any case) are returned. Subdirectories are
    /// not descended into. The order is the enumeration order used for the
    /// rest of the run.
    async fn list_image_files(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Absolute form of `path` whose last component names the directory
    ///
    /// The default joins relative paths onto the working directory and folds
    /// `.` and `..` lexically. Implementations backed by a real filesystem
    /// may canonicalize instead.
    async fn resolve_directory(&self, path: &Path) -> Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(normalize_path(&absolute))
    }
}
