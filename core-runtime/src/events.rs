//! # Event Bus System
//!
//! Typed progress and outcome events for hosts that display an upload run,
//! published over `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`BatchEvent`] for scheduler runs (upload, move,
//!   reorder, sharing) and [`PhotosetEvent`] for album-level milestones
//! - **EventBus**: Central broadcast channel; cloning shares the channel
//! - **EventStream**: Receiver wrapper with optional filtering
//!
//! Emission is best-effort. The engine never fails because nobody listens.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{BatchEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Batch(BatchEvent::Started {
//!     run_id: "run-1".to_string(),
//!     operation: "upload".to_string(),
//!     total: 12,
//!     batch_size: 4,
//! })).ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Batch(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Slow subscribers receive `RecvError::Lagged(n)` and can keep reading;
//! progress events are superseded by the next one anyway.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, error::SendError};

pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Batch scheduler events
    Batch(BatchEvent),
    /// Album-level events
    Photoset(PhotosetEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Batch(e) => e.description(),
            CoreEvent::Photoset(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Batch(BatchEvent::ItemFailed { .. }) => EventSeverity::Error,
            CoreEvent::Photoset(PhotosetEvent::AuditWarning { .. }) => EventSeverity::Warning,
            CoreEvent::Batch(BatchEvent::Completed { failed, .. }) if *failed > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Batch(BatchEvent::Progress { .. }) => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Batch Events
// ============================================================================

/// Events emitted by one batch scheduler run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BatchEvent {
    /// Run accepted its work list.
    Started {
        /// Unique identifier of this run.
        run_id: String,
        /// Operation kind (e.g. "upload", "move").
        operation: String,
        /// Number of work items.
        total: u64,
        /// Concurrency bound.
        batch_size: u64,
    },
    /// One more item finished, successfully or not.
    Progress {
        run_id: String,
        operation: String,
        processed: u64,
        total: u64,
        /// Progress percentage (0-100).
        percent: u8,
        elapsed_secs: u64,
        /// Estimated seconds until the run finishes.
        eta_secs: u64,
    },
    /// An item failed terminally and was recorded in the failure ledger.
    ItemFailed {
        run_id: String,
        operation: String,
        /// Work item key.
        item: String,
        /// Human-readable failure reason.
        message: String,
    },
    /// Every item of the run has been processed.
    Completed {
        run_id: String,
        operation: String,
        succeeded: u64,
        failed: u64,
        duration_secs: u64,
    },
}

impl BatchEvent {
    fn description(&self) -> &str {
        match self {
            BatchEvent::Started { .. } => "Batch run started",
            BatchEvent::Progress { .. } => "Batch run in progress",
            BatchEvent::ItemFailed { .. } => "Work item failed",
            BatchEvent::Completed { .. } => "Batch run completed",
        }
    }
}

// ============================================================================
// Photoset Events
// ============================================================================

/// Kind of post-run anomaly reported by the audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditWarningKind {
    /// A local file is still missing from the album.
    Leftover,
    /// A title appears more than once in the album.
    DuplicateTitle,
}

/// Album-level milestones of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PhotosetEvent {
    /// Local directory reconciled against the remote album.
    Resolved {
        title: String,
        /// Existing album id, if the album already exists.
        album_id: Option<String>,
        local_files: u64,
        already_uploaded: u64,
        pending_uploads: u64,
    },
    /// A new album was created.
    Created {
        title: String,
        album_id: String,
        cover_photo_id: String,
    },
    /// Post-run audit anomaly. Informational only.
    AuditWarning {
        album_id: String,
        kind: AuditWarningKind,
        title: String,
        /// Occurrences for duplicates, 0 for leftovers.
        count: u64,
    },
    /// Upload dates were rewritten to follow capture order.
    Reordered { album_id: String, photos: u64 },
    /// Visibility flags were applied to the album contents.
    SharingApplied {
        album_id: String,
        family: bool,
        friends: bool,
        photos: u64,
    },
}

impl PhotosetEvent {
    fn description(&self) -> &str {
        match self {
            PhotosetEvent::Resolved { .. } => "Photoset reconciled",
            PhotosetEvent::Created { .. } => "Photoset created",
            PhotosetEvent::AuditWarning { .. } => "Photoset audit warning",
            PhotosetEvent::Reordered { .. } => "Photoset reordered",
            PhotosetEvent::SharingApplied { .. } => "Photoset sharing applied",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cloning the bus is cheap and every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let failures = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.severity() >= core_runtime::events::EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without blocking.
    ///
    /// Returns `None` if no matching event is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
