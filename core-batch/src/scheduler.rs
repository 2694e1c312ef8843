//! # Batch Scheduler
//!
//! Drives many independent, possibly failing remote operations to completion
//! under a fixed concurrency bound.
//!
//! ## Overview
//!
//! The work list is split into batches of `batch_size` items. Every item of
//! a batch runs as its own tokio task, gated by a semaphore holding
//! `batch_size` permits. The scheduler waits for the whole batch before it
//! starts the next one, which gives a natural barrier for an optional pause.
//!
//! Each task is a failure boundary. An error, or a panic, is recorded in the
//! [`FailureLedger`] under the item's key and never reaches its siblings. The
//! input slice is never mutated; completion is tracked in a run-scoped state
//! guarded by a single mutex, together with the progress counters and the
//! ledger.
//!
//! ## Usage
//!
//! ```ignore
//! let scheduler = BatchScheduler::new("upload", 4).with_event_bus(bus.clone());
//! let report = scheduler
//!     .run(&files, move |path: PathBuf| {
//!         let service = Arc::clone(&service);
//!         async move { upload(&*service, &path).await }
//!     })
//!     .await;
//!
//! for (file, reason) in report.failures.iter() {
//!     warn!(file, reason, "Upload failed");
//! }
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{Clock, RemoteRecord, SystemClock};
use core_runtime::events::{BatchEvent, CoreEvent, EventBus};
use futures::FutureExt;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{BatchError, Result};
use crate::ledger::FailureLedger;
use crate::progress::{format_duration, ProgressSnapshot, ProgressState};

// ============================================================================
// Work Items
// ============================================================================

/// One unit of pending work.
///
/// The key identifies the item in the failure ledger and must be unique
/// within a run.
pub trait WorkItem: Clone + Send + Sync + 'static {
    fn key(&self) -> String;
}

impl WorkItem for PathBuf {
    fn key(&self) -> String {
        self.display().to_string()
    }
}

impl WorkItem for String {
    fn key(&self) -> String {
        self.clone()
    }
}

impl WorkItem for RemoteRecord {
    fn key(&self) -> String {
        self.id.clone()
    }
}

// ============================================================================
// Report
// ============================================================================

/// Outcome of one scheduler run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: String,
    pub operation: String,
    pub total: usize,
    pub succeeded: usize,
    pub failures: FailureLedger,
    pub elapsed: Duration,
}

impl BatchReport {
    fn empty(run_id: String, operation: &str) -> Self {
        Self {
            run_id,
            operation: operation.to_string(),
            total: 0,
            succeeded: 0,
            failures: FailureLedger::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Bounded-concurrency batch executor.
#[derive(Clone)]
pub struct BatchScheduler {
    operation: String,
    batch_size: usize,
    inter_batch_pause: Option<Duration>,
    clock: Arc<dyn Clock>,
    event_bus: Option<EventBus>,
}

impl BatchScheduler {
    /// `batch_size` is clamped to at least 1.
    pub fn new(operation: impl Into<String>, batch_size: usize) -> Self {
        Self {
            operation: operation.into(),
            batch_size: batch_size.max(1),
            inter_batch_pause: None,
            clock: Arc::new(SystemClock),
            event_bus: None,
        }
    }

    /// Sleep between consecutive batches.
    pub fn with_pause(mut self, pause: Option<Duration>) -> Self {
        self.inter_batch_pause = pause;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run `action` over every item and collect the failures.
    ///
    /// Items whose key already appeared earlier in `items` are skipped.
    /// Partial failure is reported through the returned ledger, never as an
    /// error.
    pub async fn run<T, F, Fut>(&self, items: &[T], action: F) -> BatchReport
    where
        T: WorkItem,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let run_id = Uuid::new_v4().to_string();
        let work = unique_items(items, &self.operation);
        let total = work.len();

        if total == 0 {
            debug!(operation = %self.operation, "Nothing to do");
            return BatchReport::empty(run_id, &self.operation);
        }

        let batch_count = total.div_ceil(self.batch_size);
        info!(
            operation = %self.operation,
            total,
            batch_size = self.batch_size,
            batches = batch_count,
            "Starting batch run"
        );
        let tracker = Arc::new(RunTracker {
            run_id: run_id.clone(),
            operation: self.operation.clone(),
            clock: Arc::clone(&self.clock),
            event_bus: self.event_bus.clone(),
            state: Mutex::new(RunState {
                pending: work.iter().map(WorkItem::key).collect(),
                progress: ProgressState::start(total, self.clock.now()),
                failures: FailureLedger::new(),
            }),
        });
        tracker.emit(BatchEvent::Started {
            run_id: run_id.clone(),
            operation: self.operation.clone(),
            total: total as u64,
            batch_size: self.batch_size as u64,
        });

        let action = Arc::new(action);
        let permits = Arc::new(Semaphore::new(self.batch_size));

        for (index, batch) in work.chunks(self.batch_size).enumerate() {
            debug!(
                operation = %self.operation,
                batch = index + 1,
                batches = batch_count,
                size = batch.len(),
                "Dispatching batch"
            );

            let mut tasks = JoinSet::new();
            for item in batch.iter().cloned() {
                let key = item.key();
                let action = Arc::clone(&action);
                let permits = Arc::clone(&permits);
                let tracker = Arc::clone(&tracker);

                tasks.spawn(async move {
                    let outcome = async {
                        let _permit = permits
                            .acquire_owned()
                            .await
                            .map_err(|_| BatchError::Operation("worker pool closed".to_string()))?;

                        AssertUnwindSafe(action(item))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|panic| Err(BatchError::Operation(panic_message(panic))))
                    }
                    .await;

                    tracker.complete(&key, outcome).await;
                });
            }

            // Barrier: the next batch starts only once this one has drained
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!(operation = %self.operation, error = %e, "Batch task aborted");
                }
            }

            if let Some(pause) = self.inter_batch_pause {
                if index + 1 < batch_count {
                    sleep(pause).await;
                }
            }
        }

        let (failures, elapsed) = tracker.finish().await;
        let report = BatchReport {
            run_id,
            operation: self.operation.clone(),
            total,
            succeeded: total - failures.len(),
            failures,
            elapsed,
        };

        info!(
            operation = %report.operation,
            succeeded = report.succeeded,
            failed = report.failed(),
            duration = %format_duration(report.elapsed),
            "Batch run complete"
        );
        tracker.emit(BatchEvent::Completed {
            run_id: report.run_id.clone(),
            operation: report.operation.clone(),
            succeeded: report.succeeded as u64,
            failed: report.failed() as u64,
            duration_secs: report.elapsed.as_secs(),
        });

        report
    }
}

fn unique_items<T: WorkItem>(items: &[T], operation: &str) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| {
            let key = item.key();
            if seen.insert(key.clone()) {
                true
            } else {
                warn!(operation, item = %key, "Skipping duplicate work item");
                false
            }
        })
        .cloned()
        .collect()
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("task panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("task panicked: {}", message)
    } else {
        "task panicked".to_string()
    }
}

// ============================================================================
// Run State
// ============================================================================

/// Shared state of one run. Every read-modify-write goes through `state`.
struct RunTracker {
    run_id: String,
    operation: String,
    clock: Arc<dyn Clock>,
    event_bus: Option<EventBus>,
    state: Mutex<RunState>,
}

struct RunState {
    pending: HashSet<String>,
    progress: ProgressState,
    failures: FailureLedger,
}

impl RunTracker {
    async fn complete(&self, key: &str, outcome: Result<()>) {
        let failure = outcome.err().map(|e| e.to_string());

        let snapshot = {
            let mut state = self.state.lock().await;
            state.pending.remove(key);
            if let Some(reason) = &failure {
                state.failures.record(key, reason.clone());
            }
            state.progress.record_completion(self.clock.now())
        };

        if let Some(message) = failure {
            warn!(operation = %self.operation, item = %key, error = %message, "Work item failed");
            self.emit(BatchEvent::ItemFailed {
                run_id: self.run_id.clone(),
                operation: self.operation.clone(),
                item: key.to_string(),
                message,
            });
        }

        self.report_progress(snapshot);
    }

    fn report_progress(&self, snapshot: ProgressSnapshot) {
        let eta = snapshot.eta.unwrap_or_default();
        debug!(
            operation = %self.operation,
            processed = snapshot.processed,
            total = snapshot.total,
            elapsed = %format_duration(snapshot.elapsed),
            eta = %format_duration(eta),
            "Progress"
        );
        self.emit(BatchEvent::Progress {
            run_id: self.run_id.clone(),
            operation: self.operation.clone(),
            processed: snapshot.processed as u64,
            total: snapshot.total as u64,
            percent: snapshot.percent(),
            elapsed_secs: snapshot.elapsed.as_secs(),
            eta_secs: eta.as_secs(),
        });
    }

    async fn finish(&self) -> (FailureLedger, Duration) {
        let mut state = self.state.lock().await;
        if !state.pending.is_empty() {
            error!(
                operation = %self.operation,
                unfinished = state.pending.len(),
                "Batch run ended with unfinished items"
            );
            let unfinished: Vec<String> = state.pending.drain().collect();
            for key in unfinished {
                state.failures.record(key, "task did not complete");
            }
        }
        let elapsed = state.progress.snapshot(self.clock.now()).elapsed;
        (std::mem::take(&mut state.failures), elapsed)
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Batch(event)).ok();
        }
    }
}
