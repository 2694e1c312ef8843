//! Uploader service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (photo service,
//! directory reader, confirmation prompt) into the batch engine. Desktop
//! hosts typically enable the `desktop-shims` feature, which supplies the
//! directory reader and the console prompt from `bridge-desktop`; the photo
//! service client always comes from the host.

pub mod error;

pub use core_batch::{BatchReport, FailureLedger, RunMode, RunReport, SharingPolicy};
pub use core_runtime::config::UploaderConfig;
pub use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use error::{Result, ServiceError};

use std::path::Path;
use std::sync::Arc;

use bridge_traits::{Clock, ConfirmationPrompt, PhotoDirectory, PhotoService, SystemClock};
use core_batch::PhotosetCoordinator;
use core_runtime::events::{EventBus, EventStream};
use tracing::info;

/// Aggregated handle to all bridge dependencies the uploader requires.
pub struct UploaderDependencies {
    pub photo_service: Arc<dyn PhotoService>,
    pub directory: Arc<dyn PhotoDirectory>,
    pub prompt: Arc<dyn ConfirmationPrompt>,
    pub clock: Arc<dyn Clock>,
}

impl UploaderDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        photo_service: Arc<dyn PhotoService>,
        directory: Arc<dyn PhotoDirectory>,
        prompt: Arc<dyn ConfirmationPrompt>,
    ) -> Self {
        Self {
            photo_service,
            directory,
            prompt,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct UploaderService {
    coordinator: Arc<PhotosetCoordinator>,
    event_bus: EventBus,
}

impl UploaderService {
    /// Create a new service from the provided dependencies.
    ///
    /// Fails if `config` does not validate.
    pub fn new(deps: UploaderDependencies, config: UploaderConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let coordinator = PhotosetCoordinator::new(
            deps.photo_service,
            deps.directory,
            deps.prompt,
            event_bus.clone(),
            config,
        )
        .with_clock(deps.clock);

        Ok(Self {
            coordinator: Arc::new(coordinator),
            event_bus,
        })
    }

    /// Create a service configured from `PHOTOSET_*` environment variables.
    pub fn from_env(deps: UploaderDependencies) -> Result<Self> {
        Self::new(deps, UploaderConfig::from_env()?)
    }

    /// Process one directory in the given mode.
    pub async fn run(&self, directory: impl AsRef<Path>, mode: RunMode) -> Result<RunReport> {
        let directory = directory.as_ref();
        info!(directory = %directory.display(), %mode, "Starting photoset run");
        Ok(self.coordinator.run(directory, mode).await?)
    }

    /// Like [`run`](Self::run), with the mode given as a command-line word
    /// (`upload`, `--family`, `--friends`). An empty word means `upload`.
    pub async fn run_with_mode_arg(&self, directory: impl AsRef<Path>, mode: &str) -> Result<RunReport> {
        let mode: RunMode = mode.parse()?;
        self.run(directory, mode).await
    }

    pub fn config(&self) -> &UploaderConfig {
        self.coordinator.config()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to progress and photoset events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// ```ignore
/// use core_service::{bootstrap_desktop, RunMode, UploaderConfig};
///
/// let service = bootstrap_desktop(flickr_client, UploaderConfig::from_env()?)?;
/// let report = service.run("/photos/Lisbon", RunMode::Upload).await?;
/// ```
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn bootstrap_desktop(
    photo_service: Arc<dyn PhotoService>,
    config: UploaderConfig,
) -> Result<UploaderService> {
    let deps = UploaderDependencies::new(
        photo_service,
        Arc::new(bridge_desktop::TokioPhotoDirectory::new()),
        Arc::new(bridge_desktop::ConsolePrompt::new()),
    );
    UploaderService::new(deps, config)
}
