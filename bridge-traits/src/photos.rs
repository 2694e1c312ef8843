//! Remote Photo Service Abstractions
//!
//! Capability interface for the photo-hosting service the uploader talks to.
//! The wire protocol lives with the host; the core only depends on the calls
//! declared here.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Largest page the remote service returns when listing album contents.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Snapshot of a photo already known to the remote service.
///
/// Fetched fresh for every reconciliation; never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Remote identifier
    pub id: String,
    /// Title used as the de-duplication key
    pub title: String,
    /// Capture timestamp from the photo's EXIF data, when the service knows it
    pub date_taken: Option<DateTime<Utc>>,
    /// Upload timestamp; controls the display order of the album
    pub date_uploaded: DateTime<Utc>,
}

impl RemoteRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        date_taken: Option<DateTime<Utc>>,
        date_uploaded: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date_taken,
            date_uploaded,
        }
    }
}

/// Handle to a remote album (photoset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumHandle {
    pub id: String,
    pub title: String,
    pub photo_count: u32,
}

/// One page of album contents.
#[derive(Debug, Clone, Default)]
pub struct AlbumPage {
    pub photos: Vec<RemoteRecord>,
    /// 1-based page number
    pub page: u32,
    /// Total number of pages reported by the service
    pub pages: u32,
}

/// Result of a mutating remote call, as far as the caller can tell.
///
/// `Unknown` is the dangerous case: the request may have been processed even
/// though the caller saw an error, so the write must be verified before it is
/// attempted again.
#[derive(Debug)]
pub enum WriteOutcome<T> {
    /// The service confirmed the write.
    Applied(T),
    /// The service guarantees the write did not happen.
    NotApplied(BridgeError),
    /// The write may or may not have happened.
    Unknown(BridgeError),
}

impl<T> WriteOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied(_))
    }
}

impl<T> From<Result<T>> for WriteOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => WriteOutcome::Applied(value),
            Err(err) if err.is_definitive_failure() => WriteOutcome::NotApplied(err),
            Err(err) => WriteOutcome::Unknown(err),
        }
    }
}

/// Photo hosting service trait
///
/// Every mutating call may fail after the server already processed it, so
/// each one comes with a read-only probe the core uses to check what
/// actually happened:
///
/// | Mutation | Verify probe |
/// |----------|--------------|
/// | `upload_file` | `find_unfiled_by_title` |
/// | `create_album` | `find_album_by_title` |
/// | `add_to_album` | `find_in_album_by_title` |
///
/// # Example
///
/// ```ignore
/// use bridge_traits::photos::PhotoService;
///
/// async fn upload(service: &dyn PhotoService, path: &Path) -> Result<String> {
///     let id = service.upload_file(path, "Holiday - IMG_0001").await?;
///     Ok(id)
/// }
/// ```
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Upload a local file with the given title, returning the new photo id.
    async fn upload_file(&self, path: &Path, title: &str) -> Result<String>;

    /// Find a photo with the given title that is not filed in any album.
    async fn find_unfiled_by_title(&self, title: &str) -> Result<Option<RemoteRecord>>;

    /// Create an album with the given cover photo.
    ///
    /// The cover photo becomes the first member of the album.
    async fn create_album(&self, title: &str, cover_photo_id: &str) -> Result<AlbumHandle>;

    /// Find an album whose title equals `title` exactly.
    async fn find_album_by_title(&self, title: &str) -> Result<Option<AlbumHandle>>;

    /// Add a photo to an album.
    async fn add_to_album(&self, photo_id: &str, album_id: &str) -> Result<()>;

    /// Fetch one page of album contents.
    ///
    /// `per_page` is capped at [`MAX_PAGE_SIZE`] by the service.
    async fn list_album_page(&self, album_id: &str, page: u32, per_page: u32)
        -> Result<AlbumPage>;

    /// Overwrite the upload timestamp of a photo.
    async fn set_upload_date(&self, photo_id: &str, uploaded_at: DateTime<Utc>) -> Result<()>;

    /// Set the family/friends visibility flags of a photo.
    async fn set_permissions(&self, photo_id: &str, family: bool, friends: bool) -> Result<()>;

    /// List the full contents of an album, following pagination.
    async fn list_album_contents(&self, album_id: &str) -> Result<Vec<RemoteRecord>> {
        let mut photos = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.list_album_page(album_id, page, MAX_PAGE_SIZE).await?;
            let received = batch.photos.len();
            photos.extend(batch.photos);

            if received == 0 || page >= batch.pages {
                break;
            }
            page += 1;
        }

        Ok(photos)
    }

    /// Find a photo with the given title inside an album.
    async fn find_in_album_by_title(
        &self,
        album_id: &str,
        title: &str,
    ) -> Result<Option<RemoteRecord>> {
        let photos = self.list_album_contents(album_id).await?;
        Ok(photos.into_iter().find(|photo| photo.title == title))
    }
}
