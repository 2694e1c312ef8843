//! # Batch Execution Engine
//!
//! Drives bulk photo uploads and photoset organization to completion over an
//! unreliable network.
//!
//! ## Overview
//!
//! Every remote write may fail after the server already applied it. This
//! crate makes such writes safe to retry and runs many of them under a fixed
//! concurrency bound:
//! - Uploading the files a photoset is missing
//! - Filing uploaded photos into the photoset
//! - Re-timestamping photos so the photoset displays in capture order
//! - Applying family/friends visibility
//!
//! ## Components
//!
//! - **Retry Wrapper** (`retry`): Verify-before-retry execution of one write
//! - **Batch Scheduler** (`scheduler`): Bounded concurrent batches with per-item failure isolation
//! - **Failure Ledger** (`ledger`): Item key to failure reason
//! - **Progress** (`progress`): Elapsed time, ETA and readable durations
//! - **Reconciliation** (`reconcile`): Local/remote diff and post-run audit
//! - **Ordering Pass** (`ordering`): Upload-date rewrite following capture time
//! - **Photoset Coordinator** (`coordinator`): The end-to-end workflow

pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod mode;
pub mod ordering;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod retry;
pub mod scheduler;

pub use coordinator::{PhotosetCoordinator, UploadedPhoto};
pub use error::{BatchError, Result};
pub use ledger::FailureLedger;
pub use mode::{RunMode, SharingPolicy};
pub use ordering::{plan_upload_dates, OrderingPass, ScheduledDate};
pub use progress::{format_duration, ProgressSnapshot, ProgressState};
pub use reconcile::{
    audit, compute_duplicate_titles, compute_leftovers, compute_missing, AuditReport, TitleScheme,
};
pub use report::RunReport;
pub use retry::{IdempotentRetry, RetryPolicy};
pub use scheduler::{BatchReport, BatchScheduler, WorkItem};
