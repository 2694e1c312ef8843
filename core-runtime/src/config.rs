//! # Uploader Configuration Module
//!
//! Provides configuration management for the photoset uploader.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `UploaderConfig` holding the tuning knobs of the batch engine: how many
//! remote operations run concurrently per operation kind, how the retry
//! wrapper behaves, and how photo titles are derived. Validation is fail-fast
//! so a bad setting is reported before any remote call is made.
//!
//! Settings can also be read from the environment with
//! [`UploaderConfig::from_env`], which overlays `PHOTOSET_*` variables on the
//! defaults.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::UploaderConfig;
//! use std::time::Duration;
//!
//! let config = UploaderConfig::builder()
//!     .upload_batch_size(3)
//!     .processing_batch_size(20)
//!     .retry_delay(Duration::from_millis(500))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::UploaderConfig;
//!
//! // Zero concurrency can never make progress
//! let config = UploaderConfig::builder()
//!     .upload_batch_size(0)
//!     .build()
//!     .expect("Should fail - batch size must be positive");
//! ```

use crate::error::{Error, Result};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Default number of concurrent uploads.
pub const DEFAULT_UPLOAD_BATCH_SIZE: usize = 4;

/// Default number of concurrent metadata calls (move, date, permissions).
pub const DEFAULT_PROCESSING_BATCH_SIZE: usize = 10;

/// Default attempts per remote write before an item is given up on.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default separator between album name and file stem in photo titles.
pub const DEFAULT_TITLE_SEPARATOR: &str = " - ";

/// Uploader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// Concurrency bound for uploads
    pub upload_batch_size: usize,

    /// Concurrency bound for cheap metadata calls
    pub processing_batch_size: usize,

    /// Attempts per remote write, including the first one
    pub retry_max_attempts: u32,

    /// Fixed delay between attempts
    pub retry_delay: Duration,

    /// Optional pause between consecutive batches
    pub inter_batch_pause: Option<Duration>,

    /// Separator used when deriving photo titles
    pub title_separator: String,

    /// Event bus buffer size
    pub event_buffer_size: usize,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            upload_batch_size: DEFAULT_UPLOAD_BATCH_SIZE,
            processing_batch_size: DEFAULT_PROCESSING_BATCH_SIZE,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            inter_batch_pause: None,
            title_separator: DEFAULT_TITLE_SEPARATOR.to_string(),
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl UploaderConfig {
    /// Creates a new builder for `UploaderConfig`.
    pub fn builder() -> UploaderConfigBuilder {
        UploaderConfigBuilder::default()
    }

    /// Load configuration from `PHOTOSET_*` environment variables.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `PHOTOSET_UPLOAD_BATCH_SIZE` | `upload_batch_size` |
    /// | `PHOTOSET_PROCESSING_BATCH_SIZE` | `processing_batch_size` |
    /// | `PHOTOSET_RETRY_MAX_ATTEMPTS` | `retry_max_attempts` |
    /// | `PHOTOSET_RETRY_DELAY_MS` | `retry_delay` |
    /// | `PHOTOSET_INTER_BATCH_PAUSE_MS` | `inter_batch_pause` (0 disables) |
    /// | `PHOTOSET_TITLE_SEPARATOR` | `title_separator` |
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let parsed = |key: &str| {
            lookup(key).and_then(|value| match value.trim().parse::<u64>() {
                Ok(number) => Some(number),
                Err(_) => {
                    warn!(key, value = %value, "Ignoring unparseable setting");
                    None
                }
            })
        };

        let config = Self {
            upload_batch_size: parsed("PHOTOSET_UPLOAD_BATCH_SIZE")
                .map(|v| v as usize)
                .unwrap_or(default.upload_batch_size),

            processing_batch_size: parsed("PHOTOSET_PROCESSING_BATCH_SIZE")
                .map(|v| v as usize)
                .unwrap_or(default.processing_batch_size),

            retry_max_attempts: parsed("PHOTOSET_RETRY_MAX_ATTEMPTS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(default.retry_max_attempts),

            retry_delay: parsed("PHOTOSET_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.retry_delay),

            inter_batch_pause: match parsed("PHOTOSET_INTER_BATCH_PAUSE_MS") {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => default.inter_batch_pause,
            },

            title_separator: lookup("PHOTOSET_TITLE_SEPARATOR")
                .filter(|v| !v.is_empty())
                .unwrap_or(default.title_separator),

            event_buffer_size: default.event_buffer_size,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.upload_batch_size == 0 {
            return Err(Error::Config(
                "Upload batch size must be at least 1. \
                 Set PHOTOSET_UPLOAD_BATCH_SIZE to a positive number."
                    .to_string(),
            ));
        }

        if self.processing_batch_size == 0 {
            return Err(Error::Config(
                "Processing batch size must be at least 1. \
                 Set PHOTOSET_PROCESSING_BATCH_SIZE to a positive number."
                    .to_string(),
            ));
        }

        if self.retry_max_attempts == 0 {
            return Err(Error::Config(
                "Retry attempts must be at least 1 (the first attempt counts)".to_string(),
            ));
        }

        if self.title_separator.is_empty() {
            return Err(Error::Config(
                "Title separator cannot be empty; album and file names would run together"
                    .to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for `UploaderConfig`.
#[derive(Debug, Default)]
pub struct UploaderConfigBuilder {
    config: Option<UploaderConfig>,
}

impl UploaderConfigBuilder {
    fn config_mut(&mut self) -> &mut UploaderConfig {
        self.config.get_or_insert_with(UploaderConfig::default)
    }

    /// Start from an existing configuration, e.g. one loaded from the environment.
    pub fn base(mut self, config: UploaderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the number of uploads that run concurrently.
    pub fn upload_batch_size(mut self, size: usize) -> Self {
        self.config_mut().upload_batch_size = size;
        self
    }

    /// Sets the number of metadata calls that run concurrently.
    pub fn processing_batch_size(mut self, size: usize) -> Self {
        self.config_mut().processing_batch_size = size;
        self
    }

    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config_mut().retry_max_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config_mut().retry_delay = delay;
        self
    }

    /// Pause between batches, giving the remote service room to breathe.
    pub fn inter_batch_pause(mut self, pause: Duration) -> Self {
        self.config_mut().inter_batch_pause = Some(pause);
        self
    }

    pub fn title_separator(mut self, separator: impl Into<String>) -> Self {
        self.config_mut().title_separator = separator.into();
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config_mut().event_buffer_size = size;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any setting is out of range.
    pub fn build(self) -> Result<UploaderConfig> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}
