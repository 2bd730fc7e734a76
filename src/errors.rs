use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecapError {
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to access chat platform API: {0}")]
    ChatApi(String),

    #[error("Failed to access publishing API: {0}")]
    Publish(String),

    #[error("Failed to access language model API: {0}")]
    Llm(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(String),

    #[error("Failed to access data store: {0}")]
    Store(String),

    #[error("Not enough messages in the history window ({0})")]
    InsufficientHistory(usize),

    #[error("Summarization produced no usable topics")]
    EmptySummarization,
}

impl From<reqwest::Error> for RecapError {
    fn from(error: reqwest::Error) -> Self {
        RecapError::Http(error.to_string())
    }
}

impl From<anyhow::Error> for RecapError {
    fn from(error: anyhow::Error) -> Self {
        RecapError::Store(error.to_string())
    }
}

impl RecapError {
    /// Whether the run for the current firing should be skipped quietly
    /// instead of surfaced as a failure. The next scheduled firing retries
    /// naturally.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(
            self,
            RecapError::InsufficientHistory(_) | RecapError::EmptySummarization
        )
    }
}
