//! Language-model integration: prompt construction, the OpenAI-backed
//! client and the topic rendering shared with tests.

pub mod client;
pub mod prompt_builder;

use async_trait::async_trait;

use crate::errors::RecapError;

/// The narrow language-model contract the pipeline consumes. Both calls are
/// best-effort from the pipeline's point of view: `summarize_topics`
/// failures skip the run, `condense` failures fall back locally.
#[async_trait]
pub trait LlmApi: Send + Sync {
    /// Summarize a chat transcript into per-topic summary blocks.
    async fn summarize_topics(&self, transcript: &str) -> Result<Vec<String>, RecapError>;

    /// Produce a one-line, emoji-flavored highlight of the transcript.
    async fn condense(&self, transcript: &str) -> Result<String, RecapError>;
}

// Re-export main types for convenience
pub use client::LlmClient;
