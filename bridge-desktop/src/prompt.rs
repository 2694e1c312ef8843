//! Console confirmation prompt using `dialoguer`

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    prompt::ConfirmationPrompt,
};
use dialoguer::Confirm;
use tracing::debug;

/// Interactive y/n prompt on the controlling terminal.
///
/// `dialoguer` blocks on stdin, so the question runs on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct ConsolePrompt {
    default_answer: bool,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer used when the user just presses enter
    pub fn with_default(mut self, answer: bool) -> Self {
        self.default_answer = answer;
        self
    }
}

#[async_trait]
impl ConfirmationPrompt for ConsolePrompt {
    async fn confirm(&self, question: &str) -> Result<bool> {
        let question = question.to_string();
        let default_answer = self.default_answer;

        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(question)
                .default(default_answer)
                .interact()
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Prompt task failed: {}", e)))?
        .map_err(|e| BridgeError::NotAvailable(format!("Console prompt: {}", e)))?;

        debug!(answer, "User answered confirmation prompt");
        Ok(answer)
    }
}
