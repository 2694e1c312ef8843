//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `PhotoDirectory` using `tokio::fs`
//! - `ConfirmationPrompt` using `dialoguer`
//!
//! The photo-hosting client itself is supplied by the host application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ConsolePrompt, TokioPhotoDirectory};
//! use bridge_traits::{ConfirmationPrompt, PhotoDirectory};
//!
//! #[tokio::main]
//! async fn main() {
//!     let directory = TokioPhotoDirectory::new();
//!     let prompt = ConsolePrompt::new();
//!
//!     // Use in uploader dependencies
//! }
//! ```

mod filesystem;
mod prompt;

pub use filesystem::TokioPhotoDirectory;
pub use prompt::ConsolePrompt;
