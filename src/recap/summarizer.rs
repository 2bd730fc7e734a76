//! Turns a history window into topic summaries and a condensed one-line
//! highlight.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::ai::LlmApi;
use crate::core::models::{ChatMessage, Summarization};
use crate::errors::RecapError;
use crate::telegram::formatter::truncate_chars;

/// Windows with fewer messages than this are not worth a recap.
pub const MIN_HISTORY_MESSAGES: usize = 6;

/// Character budget of the local condensed-summary fallback.
pub const CONDENSED_FALLBACK_CHARS: usize = 50;

pub struct Summarizer<L> {
    llm: Arc<L>,
}

impl<L: LlmApi> Summarizer<L> {
    #[must_use]
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    /// Summarize the window into topic blocks.
    ///
    /// # Errors
    ///
    /// `InsufficientHistory` below the message floor, `EmptySummarization`
    /// when every topic comes back blank; both skip the run. Model and
    /// network errors propagate.
    pub async fn summarize(
        &self,
        chat_id: i64,
        window: &[ChatMessage],
    ) -> Result<Summarization, RecapError> {
        if window.len() < MIN_HISTORY_MESSAGES {
            return Err(RecapError::InsufficientHistory(window.len()));
        }

        let topics = self.llm.summarize_topics(&transcript(window)).await?;
        let topics: Vec<String> = topics
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();

        if topics.is_empty() {
            warn!(chat_id, "summarization returned only blank topics");
            return Err(RecapError::EmptySummarization);
        }

        Ok(Summarization {
            log_id: Uuid::new_v4(),
            topics,
        })
    }

    /// Produce the condensed one-liner. Condensation failure is non-fatal:
    /// this always returns usable text, falling back to a truncated first
    /// topic or a placeholder naming the window.
    pub async fn condense(
        &self,
        chat_id: i64,
        window: &[ChatMessage],
        topics: &[String],
        hours: u32,
    ) -> String {
        match self.llm.condense(&transcript(window)).await {
            Ok(condensed) if !condensed.trim().is_empty() => condensed.trim().to_string(),
            Ok(_) => {
                warn!(chat_id, "condensed summary came back empty, using fallback");
                fallback_condensed(topics, hours)
            }
            Err(e) => {
                warn!(chat_id, "failed to generate condensed summary, using fallback: {e}");
                fallback_condensed(topics, hours)
            }
        }
    }
}

/// The line-per-message transcript fed to the model.
#[must_use]
pub fn transcript(window: &[ChatMessage]) -> String {
    window
        .iter()
        .map(|m| format!("{} | {}: {}", m.id, m.sender, m.text))
        .collect::<Vec<String>>()
        .join("\n")
}

#[must_use]
pub fn fallback_condensed(topics: &[String], hours: u32) -> String {
    match topics.first() {
        Some(first) => {
            if first.chars().count() > CONDENSED_FALLBACK_CHARS {
                format!("{}…", truncate_chars(first, CONDENSED_FALLBACK_CHARS))
            } else {
                first.clone()
            }
        }
        None => format!("A recap of the last {hours} hours of group chat."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeLlm {
        topics: Result<Vec<String>, String>,
        condensed: Result<String, String>,
    }

    impl FakeLlm {
        fn new(topics: Result<Vec<String>, String>, condensed: Result<String, String>) -> Self {
            Self { topics, condensed }
        }
    }

    #[async_trait]
    impl LlmApi for FakeLlm {
        async fn summarize_topics(&self, _transcript: &str) -> Result<Vec<String>, RecapError> {
            self.topics.clone().map_err(RecapError::Llm)
        }

        async fn condense(&self, _transcript: &str) -> Result<String, RecapError> {
            self.condensed.clone().map_err(RecapError::Llm)
        }
    }

    fn window(count: usize) -> Vec<ChatMessage> {
        (0..count)
            .map(|i| ChatMessage {
                id: i as i64,
                chat_title: "chat".to_string(),
                sender: format!("user{i}"),
                text: format!("message {i}"),
                sent_at: Utc::now(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_summarize_rejects_short_window() {
        let llm = Arc::new(FakeLlm::new(Ok(vec!["topic".to_string()]), Ok("c".to_string())));
        let summarizer = Summarizer::new(llm);

        let err = summarizer.summarize(1, &window(5)).await.unwrap_err();
        assert!(matches!(err, RecapError::InsufficientHistory(5)));
        assert!(err.is_skip());
    }

    #[tokio::test]
    async fn test_summarize_filters_blank_topics() {
        let llm = Arc::new(FakeLlm::new(
            Ok(vec![
                "  ".to_string(),
                "## Real topic\n- point".to_string(),
                String::new(),
            ]),
            Ok("c".to_string()),
        ));
        let summarizer = Summarizer::new(llm);

        let result = summarizer.summarize(1, &window(6)).await.unwrap();
        assert_eq!(result.topics, vec!["## Real topic\n- point".to_string()]);
    }

    #[tokio::test]
    async fn test_summarize_fails_when_all_topics_blank() {
        let llm = Arc::new(FakeLlm::new(
            Ok(vec!["  ".to_string(), String::new()]),
            Ok("c".to_string()),
        ));
        let summarizer = Summarizer::new(llm);

        let err = summarizer.summarize(1, &window(10)).await.unwrap_err();
        assert!(matches!(err, RecapError::EmptySummarization));
        assert!(err.is_skip());
    }

    #[tokio::test]
    async fn test_condense_trims_model_output() {
        let llm = Arc::new(FakeLlm::new(
            Ok(vec![]),
            Ok("  the chat argued about tabs 🧵  ".to_string()),
        ));
        let summarizer = Summarizer::new(llm);

        let condensed = summarizer.condense(1, &window(6), &[], 6).await;
        assert_eq!(condensed, "the chat argued about tabs 🧵");
    }

    #[tokio::test]
    async fn test_condense_falls_back_to_truncated_first_topic() {
        let llm = Arc::new(FakeLlm::new(Ok(vec![]), Err("model down".to_string())));
        let summarizer = Summarizer::new(llm);

        let long_topic = "t".repeat(80);
        let condensed = summarizer
            .condense(1, &window(6), &[long_topic.clone()], 6)
            .await;

        assert_eq!(condensed.chars().count(), CONDENSED_FALLBACK_CHARS + 1);
        assert!(condensed.ends_with('…'));
        assert!(long_topic.starts_with(condensed.trim_end_matches('…')));
    }

    #[tokio::test]
    async fn test_condense_short_topic_is_kept_whole() {
        let llm = Arc::new(FakeLlm::new(Ok(vec![]), Err("model down".to_string())));
        let summarizer = Summarizer::new(llm);

        let condensed = summarizer
            .condense(1, &window(6), &["short topic".to_string()], 6)
            .await;
        assert_eq!(condensed, "short topic");
    }

    #[tokio::test]
    async fn test_condense_placeholder_without_topics() {
        let llm = Arc::new(FakeLlm::new(Ok(vec![]), Err("model down".to_string())));
        let summarizer = Summarizer::new(llm);

        let condensed = summarizer.condense(1, &window(6), &[], 12).await;
        assert!(condensed.contains("12 hours"));
    }

    #[test]
    fn test_transcript_line_format() {
        let lines = transcript(&window(2));
        assert_eq!(lines, "0 | user0: message 0\n1 | user1: message 1");
    }
}
