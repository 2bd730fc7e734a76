//! The configuration/subscriber store consumed by the pipeline.
//!
//! The pipeline only ever talks to the narrow [`RecapStore`] contract;
//! persistence engines are a host concern. [`memory::MemoryStore`] is the
//! in-process reference implementation.

pub mod memory;

use async_trait::async_trait;

use crate::core::models::{ChatMessage, RecapOptions, SentMessageRecord, Subscriber};
use crate::errors::RecapError;

/// Synchronous-read/write store for recap options, subscribers, history and
/// sent-message records.
#[async_trait]
pub trait RecapStore: Send + Sync {
    async fn recap_enabled(&self, chat_id: i64) -> Result<bool, RecapError>;

    /// `None` means the chat was never configured; callers fall back to the
    /// default options.
    async fn recap_options(&self, chat_id: i64) -> Result<Option<RecapOptions>, RecapError>;

    async fn subscribers(&self, chat_id: i64) -> Result<Vec<Subscriber>, RecapError>;

    async fn unsubscribe(&self, chat_id: i64, user_id: i64) -> Result<(), RecapError>;

    /// The ordered messages sent in the chat during the last `hours` hours.
    async fn history_window(&self, chat_id: i64, hours: u32)
    -> Result<Vec<ChatMessage>, RecapError>;

    async fn save_sent_message(&self, record: SentMessageRecord) -> Result<(), RecapError>;

    /// The most recent record still marked pinned for the chat, if any.
    async fn last_pinned_message(
        &self,
        chat_id: i64,
    ) -> Result<Option<SentMessageRecord>, RecapError>;

    async fn set_message_pinned(
        &self,
        chat_id: i64,
        message_id: i64,
        pinned: bool,
    ) -> Result<(), RecapError>;
}
