//! Summary of one photoset run.

use crate::reconcile::AuditReport;
use crate::scheduler::BatchReport;

/// Outcome of [`PhotosetCoordinator::process_directory`](crate::coordinator::PhotosetCoordinator::process_directory)
/// or [`share_directory`](crate::coordinator::PhotosetCoordinator::share_directory).
///
/// Each pass that ran carries its own failure ledger.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub photoset_title: String,
    /// `None` when no album exists yet and nothing could be uploaded
    pub album_id: Option<String>,
    pub album_created: bool,
    pub local_files: usize,
    pub already_uploaded: usize,
    pub upload: Option<BatchReport>,
    pub filing: Option<BatchReport>,
    pub ordering: Option<BatchReport>,
    pub sharing: Option<BatchReport>,
    pub audit: Option<AuditReport>,
    /// Why the photoset could not be created, if it could not
    pub album_error: Option<String>,
    /// Titles of photos uploaded by this run but left outside any photoset
    pub unfiled: Vec<String>,
}

impl RunReport {
    pub(crate) fn new(photoset_title: impl Into<String>) -> Self {
        Self {
            photoset_title: photoset_title.into(),
            ..Default::default()
        }
    }

    /// Total terminal failures across all passes, counting photos left
    /// unfiled because the photoset could not be created.
    pub fn failed_items(&self) -> usize {
        self.passes().map(BatchReport::failed).sum::<usize>() + self.unfiled.len()
    }

    /// Photos uploaded by this run.
    pub fn uploaded(&self) -> usize {
        self.upload.as_ref().map_or(0, |report| report.succeeded)
    }

    /// No pass failed an item, the photoset exists and the audit found nothing.
    pub fn is_clean(&self) -> bool {
        self.failed_items() == 0
            && self.album_error.is_none()
            && self.audit.as_ref().map_or(true, AuditReport::is_clean)
    }

    fn passes(&self) -> impl Iterator<Item = &BatchReport> {
        [&self.upload, &self.filing, &self.ordering, &self.sharing]
            .into_iter()
            .flatten()
    }
}
