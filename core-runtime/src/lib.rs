//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the photoset uploader:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the batch engine and the service
//! façade depend on. It fixes the logging conventions, the tunable settings
//! of a run, and the typed events hosts subscribe to for progress display.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::UploaderConfig;
pub use error::{Error, Result};
