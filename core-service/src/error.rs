use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Batch error: {0}")]
    Batch(#[from] core_batch::BatchError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
