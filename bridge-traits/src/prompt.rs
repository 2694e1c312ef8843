//! User Confirmation
//!
//! The uploader asks the user before the first remote mutation of a run.

use async_trait::async_trait;

use crate::error::Result;

/// Confirmation prompt trait
///
/// Returning `false` aborts the run before anything is written remotely.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Ask a yes/no question
    async fn confirm(&self, question: &str) -> Result<bool>;
}

/// Prompt that answers every question with a fixed value.
///
/// Used for unattended runs and in tests.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmationPrompt for AutoConfirm {
    async fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(self.0)
    }
}
