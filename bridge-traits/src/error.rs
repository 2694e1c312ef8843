use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request rejected by remote service: {0}")]
    Rejected(String),

    #[error("Remote service is throttling requests")]
    Throttled { retry_after_secs: Option<u64> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error guarantees that no remote mutation took place.
    ///
    /// `OperationFailed` is the ambiguous case: the request may have been
    /// processed before the connection dropped.
    pub fn is_definitive_failure(&self) -> bool {
        !matches!(self, BridgeError::OperationFailed(_))
    }

    /// Server-suggested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BridgeError::Throttled {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
