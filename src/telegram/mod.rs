//! All chat-platform-specific functionality.

pub mod client;
pub mod formatter;

use async_trait::async_trait;

use crate::core::models::{ChatInfo, MemberStatus};
use crate::errors::RecapError;

/// Per-message length limit of the chat platform, in characters.
pub const MESSAGE_LENGTH_LIMIT: usize = 4096;

/// The narrow chat-platform contract the pipeline consumes. All calls may
/// fail with transient network errors; the implementation retries them
/// internally before surfacing.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send an HTML-formatted message; returns the platform message id.
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<i64, RecapError>;

    async fn edit_message(&self, chat_id: i64, message_id: i64, html: &str)
    -> Result<(), RecapError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError>;

    async fn pin_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError>;

    async fn unpin_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError>;

    async fn get_chat(&self, chat_id: i64) -> Result<ChatInfo, RecapError>;

    async fn get_chat_member(&self, chat_id: i64, user_id: i64)
    -> Result<MemberStatus, RecapError>;
}

// Re-export main types for convenience
pub use client::TelegramClient;
