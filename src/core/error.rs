/// Errors that end a single poll cycle

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    /// Server answered with a non-2xx status
    #[error("Response status: {0}")]
    Status(StatusCode),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid measurement payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected at least {expected} channels, got {got}")]
    ShortFrame { expected: usize, got: usize },
}

impl PollError {
    /// True for failures of the HTTP exchange itself
    pub fn is_network(&self) -> bool {
        matches!(self, PollError::Status(_) | PollError::Transport(_))
    }
}
