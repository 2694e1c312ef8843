//! # Host Bridge Traits
//!
//! Capability traits the uploader core depends on but does not implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the batch engine and the outside
//! world. The photo-hosting API client, the local filesystem and the console
//! are all reached through the traits declared here, so the core can be driven
//! by real adapters on desktop and by in-memory fakes in tests.
//!
//! ## Traits
//!
//! ### Remote
//! - [`PhotoService`](photos::PhotoService) - Upload, album management, date and permission updates
//!
//! ### Local
//! - [`PhotoDirectory`](storage::PhotoDirectory) - Non-recursive `.jpg`/`.jpeg` enumeration
//! - [`ConfirmationPrompt`](prompt::ConfirmationPrompt) - Yes/no question before the first write
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic progress tests
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! should report `OperationFailed` only when the outcome of a write is unknown
//! (timeouts, dropped connections). Every other variant tells the core that
//! nothing changed remotely, which lets it skip the verify probe.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds; the batch scheduler shares
//! one adapter instance across all concurrent tasks of a run.

pub mod error;
pub mod photos;
pub mod prompt;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use photos::{AlbumHandle, AlbumPage, PhotoService, RemoteRecord, WriteOutcome, MAX_PAGE_SIZE};
pub use prompt::{AutoConfirm, ConfirmationPrompt};
pub use storage::{is_image_file, normalize_path, PhotoDirectory, IMAGE_EXTENSIONS};
pub use time::{Clock, ManualClock, SystemClock};
