use bridge_traits::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Directory not found: {0}")]
    InvalidPath(PathBuf),

    #[error("No .jpg or .jpeg files found in {0}")]
    NoFiles(PathBuf),

    #[error("Upload of {files} files to photoset '{photoset}' declined")]
    Declined { photoset: String, files: usize },

    #[error("Photoset '{0}' not found")]
    AlbumNotFound(String),

    #[error("Invalid run mode: {0}")]
    InvalidMode(String),

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: BridgeError,
    },

    #[error("Could not verify whether {operation} took effect: {source}")]
    VerificationFailed {
        operation: String,
        #[source]
        source: BridgeError,
    },

    #[error("{title} is already in the list of uploaded files")]
    DuplicateUpload { title: String, photo_id: String },

    #[error("{0}")]
    Operation(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl BatchError {
    /// Errors that stop a run before any remote write.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            BatchError::InvalidPath(_)
                | BatchError::NoFiles(_)
                | BatchError::Declined { .. }
                | BatchError::AlbumNotFound(_)
                | BatchError::InvalidMode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
