//! # Ordering Pass
//!
//! The remote service shows album contents by upload time and offers no way
//! to sort by capture time. This pass rewrites upload timestamps so that the
//! two orders agree.
//!
//! Photos are sorted by capture time (undated photos first, ties keep album
//! order). With `N` photos and `latest` the newest upload timestamp in the
//! album, photo `i` gets `latest - (N - i)` seconds: strictly increasing,
//! one second apart, the last one just before `latest`.
//!
//! The whole schedule is computed before anything is dispatched, so the
//! assignment does not depend on which task finishes first.

use std::sync::Arc;

use bridge_traits::{PhotoService, RemoteRecord};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument};

use crate::error::Result;
use crate::retry::IdempotentRetry;
use crate::scheduler::{BatchReport, BatchScheduler, WorkItem};

/// Upload timestamp assigned to one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDate {
    pub photo: RemoteRecord,
    pub upload_date: DateTime<Utc>,
}

impl WorkItem for ScheduledDate {
    fn key(&self) -> String {
        self.photo.id.clone()
    }
}

/// Compute the upload timestamp of every photo, in capture order.
pub fn plan_upload_dates(photos: &[RemoteRecord]) -> Vec<ScheduledDate> {
    let Some(latest) = photos.iter().map(|photo| photo.date_uploaded).max() else {
        return Vec::new();
    };

    let mut ordered = photos.to_vec();
    // Stable: equal capture times keep their album order
    ordered.sort_by_key(|photo| photo.date_taken);

    let count = ordered.len() as i64;
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, photo)| ScheduledDate {
            upload_date: latest - Duration::seconds(count - index as i64),
            photo,
        })
        .collect()
}

/// Applies a date plan through the batch scheduler.
pub struct OrderingPass {
    scheduler: BatchScheduler,
    retry: IdempotentRetry,
}

impl OrderingPass {
    pub fn new(scheduler: BatchScheduler, retry: IdempotentRetry) -> Self {
        Self { scheduler, retry }
    }

    /// Rewrite the upload dates of `photos`.
    #[instrument(skip(self, service, photos), fields(photos = photos.len()))]
    pub async fn run(&self, service: Arc<dyn PhotoService>, photos: &[RemoteRecord]) -> BatchReport {
        let plan = plan_upload_dates(photos);
        info!(photos = plan.len(), "Setting photo upload dates in the photoset");

        let retry = self.retry;
        self.scheduler
            .run(&plan, move |scheduled: ScheduledDate| {
                let service = Arc::clone(&service);
                async move { apply_date(service.as_ref(), &retry, &scheduled).await }
            })
            .await
    }
}

async fn apply_date(
    service: &dyn PhotoService,
    retry: &IdempotentRetry,
    scheduled: &ScheduledDate,
) -> Result<()> {
    retry
        .execute_unverified("set upload date", || {
            service.set_upload_date(&scheduled.photo.id, scheduled.upload_date)
        })
        .await
}
