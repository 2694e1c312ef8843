//! # Photoset Coordinator
//!
//! Drives one local directory through the full upload workflow.
//!
//! ## Overview
//!
//! The `PhotosetCoordinator` ties the batch engine to the capability traits.
//! It owns no global state: the photo service, the directory reader, the
//! confirmation prompt and the clock are all injected, so two coordinators
//! with different sessions can coexist in one process.
//!
//! ## Workflow
//!
//! ### Upload
//! 1. Scan the directory for `.jpg`/`.jpeg` files
//! 2. Resolve the photoset named after the directory and diff its contents
//!    against the local files
//! 3. Ask for confirmation (nothing remote has changed before this point)
//! 4. Upload the missing files (verify probe: unfiled photo with that title)
//! 5. Create the photoset if needed, using the first uploaded photo as cover
//! 6. Move the uploaded photos into the photoset (verify probe: photo with
//!    that title inside the photoset)
//! 7. Audit the photoset against a fresh local scan
//! 8. Rewrite upload dates so the photoset displays in capture order
//! 9. Optionally apply sharing flags
//!
//! ### Share
//! 1. Resolve the photoset named after the directory
//! 2. Apply the family or friends visibility flags to every photo
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_batch::{PhotosetCoordinator, RunMode};
//!
//! let coordinator = PhotosetCoordinator::new(service, directory, prompt, event_bus, config);
//! let report = coordinator.run(Path::new("/photos/Lisbon"), RunMode::Upload).await?;
//!
//! if !report.is_clean() {
//!     println!("{} items failed", report.failed_items());
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AlbumHandle, Clock, ConfirmationPrompt, PhotoDirectory, PhotoService, RemoteRecord,
    SystemClock,
};
use core_runtime::config::UploaderConfig;
use core_runtime::events::{AuditWarningKind, CoreEvent, EventBus, PhotosetEvent};
use core_runtime::logging::strip_path;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{BatchError, Result};
use crate::mode::{RunMode, SharingPolicy};
use crate::ordering::OrderingPass;
use crate::reconcile::{audit, compute_missing, AuditReport, TitleScheme};
use crate::report::RunReport;
use crate::retry::{IdempotentRetry, RetryPolicy};
use crate::scheduler::{BatchReport, BatchScheduler, WorkItem};

/// A photo uploaded during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPhoto {
    pub path: PathBuf,
    pub title: String,
    pub photo_id: String,
}

impl WorkItem for UploadedPhoto {
    fn key(&self) -> String {
        self.photo_id.clone()
    }
}

/// Orchestrates upload, filing, audit, ordering and sharing of a photoset.
pub struct PhotosetCoordinator {
    service: Arc<dyn PhotoService>,
    directory: Arc<dyn PhotoDirectory>,
    prompt: Arc<dyn ConfirmationPrompt>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    config: UploaderConfig,
    retry: IdempotentRetry,
    titles: TitleScheme,
}

impl PhotosetCoordinator {
    pub fn new(
        service: Arc<dyn PhotoService>,
        directory: Arc<dyn PhotoDirectory>,
        prompt: Arc<dyn ConfirmationPrompt>,
        event_bus: EventBus,
        config: UploaderConfig,
    ) -> Self {
        Self {
            retry: IdempotentRetry::new(RetryPolicy::from_config(&config)),
            titles: TitleScheme::from_config(&config),
            service,
            directory,
            prompt,
            clock: Arc::new(SystemClock),
            event_bus,
            config,
        }
    }

    /// Replace the time source used for progress and ETA.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn titles(&self) -> &TitleScheme {
        &self.titles
    }

    /// Run `mode` against `directory`.
    pub async fn run(&self, directory: &Path, mode: RunMode) -> Result<RunReport> {
        match mode.sharing_policy() {
            None => self.process_directory(directory, None).await,
            Some(policy) => self.share_directory(directory, policy).await,
        }
    }

    /// Upload the missing files of `directory` and organize its photoset.
    ///
    /// Fails before any remote mutation if the directory is missing, holds
    /// no photos, or the user declines. Per-photo failures, and a photoset
    /// that could not be created after uploading, are reported in the
    /// returned [`RunReport`].
    #[instrument(skip(self), fields(directory = %directory.display()))]
    pub async fn process_directory(
        &self,
        directory: &Path,
        sharing: Option<SharingPolicy>,
    ) -> Result<RunReport> {
        info!("Phase 1: Scanning local directory");
        let (directory, title, files) = self.scan(directory).await?;
        let titles = self.titles.for_photoset(&title);
        let mut report = RunReport::new(&title);
        report.local_files = files.len();

        info!("Phase 2: Reconciling with remote photoset");
        let album = self.find_album(&title).await?;
        let remote = match &album {
            Some(album) => self.service.list_album_contents(&album.id).await?,
            None => Vec::new(),
        };
        let missing = compute_missing(&titles, &files, &remote);
        report.album_id = album.as_ref().map(|album| album.id.clone());
        report.already_uploaded = files.len() - missing.len();

        info!(
            photoset = %title,
            exists = album.is_some(),
            local = files.len(),
            already_uploaded = report.already_uploaded,
            missing = missing.len(),
            "Photoset reconciled"
        );
        self.emit(PhotosetEvent::Resolved {
            title: title.clone(),
            album_id: report.album_id.clone(),
            local_files: files.len() as u64,
            already_uploaded: report.already_uploaded as u64,
            pending_uploads: missing.len() as u64,
        });

        if missing.is_empty() {
            info!(photoset = %title, "All photos are already in the photoset");
            if let (Some(album), Some(policy)) = (&album, sharing) {
                report.sharing = Some(self.apply_sharing(&album.id, &remote, policy).await);
            }
            return Ok(report);
        }

        info!("Phase 3: Confirming upload");
        let question = format!(
            "Agree to upload {} files to {} photoset '{}'?",
            missing.len(),
            if album.is_some() { "the existing" } else { "a new" },
            title
        );
        if !self.prompt.confirm(&question).await? {
            info!(photoset = %title, "Upload declined");
            return Err(BatchError::Declined {
                photoset: title,
                files: missing.len(),
            });
        }

        info!(files = missing.len(), "Phase 4: Uploading photos");
        let (upload, uploaded) = self.upload_files(&titles, &missing).await;
        summarize(&upload);
        report.upload = Some(upload);

        if uploaded.is_empty() {
            warn!(photoset = %title, "No photos were uploaded");
            if album.is_none() {
                return Ok(report);
            }
        }

        let (album_id, to_file) = match album {
            Some(album) => (album.id, uploaded),
            None => {
                info!("Phase 5: Creating photoset");
                let mut uploaded = uploaded;
                let cover = uploaded.remove(0);
                let outcome = self.create_album(&title, &cover.photo_id).await;
                let created = match outcome {
                    Ok(created) => created,
                    Err(e) => {
                        warn!(
                            photoset = %title,
                            error = %e,
                            unfiled = uploaded.len() + 1,
                            "Could not create photoset, uploaded photos left unfiled"
                        );
                        report.album_error = Some(e.to_string());
                        report.unfiled = std::iter::once(cover)
                            .chain(uploaded)
                            .map(|photo| photo.title)
                            .collect();
                        return Ok(report);
                    }
                };
                info!(photoset = %title, album_id = %created.id, cover = %cover.title, "Photoset created");
                self.emit(PhotosetEvent::Created {
                    title: title.clone(),
                    album_id: created.id.clone(),
                    cover_photo_id: cover.photo_id,
                });
                report.album_created = true;
                (created.id, uploaded)
            }
        };
        report.album_id = Some(album_id.clone());

        info!(photos = to_file.len(), "Phase 6: Moving photos into photoset");
        let filing = self.file_photos(&album_id, &to_file).await;
        summarize(&filing);
        report.filing = Some(filing);

        info!("Phase 7: Auditing photoset");
        let contents = match self.service.list_album_contents(&album_id).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(album_id = %album_id, error = %e, "Could not re-read photoset, skipping audit");
                return Ok(report);
            }
        };
        match self.directory.list_image_files(&directory).await {
            Ok(local) => {
                let findings = audit(&titles, &local, &contents);
                self.report_audit(&album_id, &findings);
                report.audit = Some(findings);
            }
            Err(e) => warn!(error = %e, "Could not rescan directory, skipping audit"),
        }

        if contents.len() > 1 {
            info!(photos = contents.len(), "Phase 8: Ordering photoset by capture time");
            let pass = OrderingPass::new(
                self.scheduler("set upload date", self.config.processing_batch_size),
                self.retry,
            );
            let ordering = pass.run(Arc::clone(&self.service), &contents).await;
            summarize(&ordering);
            self.emit(PhotosetEvent::Reordered {
                album_id: album_id.clone(),
                photos: ordering.succeeded as u64,
            });
            report.ordering = Some(ordering);
        }

        if let Some(policy) = sharing {
            info!("Phase 9: Applying sharing");
            report.sharing = Some(self.apply_sharing(&album_id, &contents, policy).await);
        }

        info!(
            photoset = %title,
            uploaded = report.uploaded(),
            failed = report.failed_items(),
            "Photoset run complete"
        );
        Ok(report)
    }

    /// Apply `policy` to every photo of the photoset named after `directory`.
    #[instrument(skip(self), fields(directory = %directory.display()))]
    pub async fn share_directory(&self, directory: &Path, policy: SharingPolicy) -> Result<RunReport> {
        let (_, title) = self.resolve(directory).await?;
        let album = self
            .find_album(&title)
            .await?
            .ok_or_else(|| BatchError::AlbumNotFound(title.clone()))?;
        let photos = self.service.list_album_contents(&album.id).await?;

        let mut report = RunReport::new(&title);
        report.album_id = Some(album.id.clone());
        report.sharing = Some(self.apply_sharing(&album.id, &photos, policy).await);
        Ok(report)
    }

    // ========================================================================
    // Phases
    // ========================================================================

    /// Resolve `directory` to an absolute path and the photoset title it names.
    async fn resolve(&self, directory: &Path) -> Result<(PathBuf, String)> {
        let resolved = self
            .directory
            .resolve_directory(directory)
            .await
            .map_err(|e| {
                debug!(error = %e, "Could not resolve directory");
                BatchError::InvalidPath(directory.to_path_buf())
            })?;
        let title = self
            .titles
            .photoset_title_for_directory(&resolved)
            .ok_or_else(|| BatchError::InvalidPath(directory.to_path_buf()))?;
        Ok((resolved, title))
    }

    async fn scan(&self, directory: &Path) -> Result<(PathBuf, String, Vec<PathBuf>)> {
        let (resolved, title) = self.resolve(directory).await?;
        if !self.directory.is_directory(&resolved).await? {
            return Err(BatchError::InvalidPath(directory.to_path_buf()));
        }

        let files = self.directory.list_image_files(&resolved).await?;
        if files.is_empty() {
            return Err(BatchError::NoFiles(resolved));
        }

        Ok((resolved, title, files))
    }

    async fn find_album(&self, title: &str) -> Result<Option<AlbumHandle>> {
        Ok(exact_album(self.service.as_ref(), title).await?)
    }

    /// Upload `files` and return the uploaded photos in local order.
    async fn upload_files(
        &self,
        titles: &TitleScheme,
        files: &[PathBuf],
    ) -> (BatchReport, Vec<UploadedPhoto>) {
        let collected: Arc<Mutex<Vec<UploadedPhoto>>> = Arc::new(Mutex::new(Vec::new()));

        let service = Arc::clone(&self.service);
        let titles = titles.clone();
        let retry = self.retry;
        let sink = Arc::clone(&collected);

        let report = self
            .scheduler("upload", self.config.upload_batch_size)
            .run(files, move |path: PathBuf| {
                let service = Arc::clone(&service);
                let sink = Arc::clone(&sink);
                let title = titles.title_key(&path);
                async move {
                    let photo_id = upload_photo(service.as_ref(), &retry, &path, &title).await?;
                    record_upload(&sink, UploadedPhoto {
                        path,
                        title,
                        photo_id,
                    })
                    .await
                }
            })
            .await;

        let mut uploaded = std::mem::take(&mut *collected.lock().await);
        let position: HashMap<&Path, usize> = files
            .iter()
            .enumerate()
            .map(|(index, file)| (file.as_path(), index))
            .collect();
        uploaded.sort_by_key(|photo| position.get(photo.path.as_path()).copied());

        (report, uploaded)
    }

    async fn create_album(&self, title: &str, cover_photo_id: &str) -> Result<AlbumHandle> {
        let service = self.service.as_ref();
        self.retry
            .execute(
                "create photoset",
                || service.create_album(title, cover_photo_id),
                || exact_album(service, title),
            )
            .await
    }

    async fn file_photos(&self, album_id: &str, photos: &[UploadedPhoto]) -> BatchReport {
        let service = Arc::clone(&self.service);
        let retry = self.retry;
        let album_id = album_id.to_string();

        self.scheduler("move", self.config.processing_batch_size)
            .run(photos, move |photo: UploadedPhoto| {
                let service = Arc::clone(&service);
                let album_id = album_id.clone();
                async move { file_photo(service.as_ref(), &retry, &album_id, &photo).await }
            })
            .await
    }

    async fn apply_sharing(
        &self,
        album_id: &str,
        photos: &[RemoteRecord],
        policy: SharingPolicy,
    ) -> BatchReport {
        info!(
            album_id,
            photos = photos.len(),
            family = policy.family,
            friends = policy.friends,
            "Setting photo permissions"
        );
        let service = Arc::clone(&self.service);
        let retry = self.retry;

        let report = self
            .scheduler("set permissions", self.config.processing_batch_size)
            .run(photos, move |photo: RemoteRecord| {
                let service = Arc::clone(&service);
                async move {
                    retry
                        .execute_unverified("set permissions", || {
                            service.set_permissions(&photo.id, policy.family, policy.friends)
                        })
                        .await
                }
            })
            .await;
        summarize(&report);

        self.emit(PhotosetEvent::SharingApplied {
            album_id: album_id.to_string(),
            family: policy.family,
            friends: policy.friends,
            photos: report.succeeded as u64,
        });
        report
    }

    fn report_audit(&self, album_id: &str, findings: &AuditReport) {
        if findings.is_clean() {
            info!(album_id, "Photoset matches the local directory");
            return;
        }

        for title in &findings.leftovers {
            warn!(album_id, title = %title, "Photo was not uploaded");
            self.emit(PhotosetEvent::AuditWarning {
                album_id: album_id.to_string(),
                kind: AuditWarningKind::Leftover,
                title: title.clone(),
                count: 0,
            });
        }
        for (title, count) in &findings.duplicates {
            warn!(album_id, title = %title, count, "Photo has duplicates in the photoset");
            self.emit(PhotosetEvent::AuditWarning {
                album_id: album_id.to_string(),
                kind: AuditWarningKind::DuplicateTitle,
                title: title.clone(),
                count: *count as u64,
            });
        }
    }

    fn scheduler(&self, operation: &str, batch_size: usize) -> BatchScheduler {
        BatchScheduler::new(operation, batch_size)
            .with_pause(self.config.inter_batch_pause)
            .with_clock(Arc::clone(&self.clock))
            .with_event_bus(self.event_bus.clone())
    }

    fn emit(&self, event: PhotosetEvent) {
        self.event_bus.emit(CoreEvent::Photoset(event)).ok();
    }
}

// ============================================================================
// Per-item Operations
// ============================================================================

async fn upload_photo(
    service: &dyn PhotoService,
    retry: &IdempotentRetry,
    path: &Path,
    title: &str,
) -> Result<String> {
    debug!(file = %strip_path(&path.to_string_lossy()), title, "Uploading photo");
    retry
        .execute(
            "upload",
            || service.upload_file(path, title),
            || unfiled_photo_id(service, title),
        )
        .await
}

async fn record_upload(sink: &Mutex<Vec<UploadedPhoto>>, photo: UploadedPhoto) -> Result<()> {
    let mut uploaded = sink.lock().await;
    if uploaded.iter().any(|known| known.photo_id == photo.photo_id) {
        return Err(BatchError::DuplicateUpload {
            title: photo.title,
            photo_id: photo.photo_id,
        });
    }
    uploaded.push(photo);
    Ok(())
}

async fn file_photo(
    service: &dyn PhotoService,
    retry: &IdempotentRetry,
    album_id: &str,
    photo: &UploadedPhoto,
) -> Result<()> {
    retry
        .execute(
            "move to photoset",
            || service.add_to_album(&photo.photo_id, album_id),
            || filed_in_album(service, album_id, &photo.title),
        )
        .await
}

async fn unfiled_photo_id(service: &dyn PhotoService, title: &str) -> BridgeResult<Option<String>> {
    Ok(service
        .find_unfiled_by_title(title)
        .await?
        .map(|photo| photo.id))
}

async fn filed_in_album(
    service: &dyn PhotoService,
    album_id: &str,
    title: &str,
) -> BridgeResult<Option<()>> {
    Ok(service
        .find_in_album_by_title(album_id, title)
        .await?
        .map(|_| ()))
}

async fn exact_album(service: &dyn PhotoService, title: &str) -> BridgeResult<Option<AlbumHandle>> {
    Ok(service
        .find_album_by_title(title)
        .await?
        .filter(|album| album.title == title))
}

fn summarize(report: &BatchReport) {
    if report.is_clean() {
        info!(operation = %report.operation, processed = report.total, "Successfully processed all items");
        return;
    }
    for (item, reason) in report.failures.iter() {
        warn!(operation = %report.operation, item, reason, "Processed with errors");
    }
}
