//! In-memory [`RecapStore`] implementation.
//!
//! Backs the integration tests and serves as the reference for hosts that
//! wire a real database behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::core::models::{ChatMessage, RecapOptions, SentMessageRecord, Subscriber};
use crate::errors::RecapError;
use crate::store::RecapStore;

#[derive(Default)]
struct Inner {
    options: HashMap<i64, RecapOptions>,
    subscribers: HashMap<i64, Vec<Subscriber>>,
    history: HashMap<i64, Vec<ChatMessage>>,
    sent_messages: Vec<SentMessageRecord>,
    unsubscribe_calls: Vec<(i64, i64)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_options(&self, chat_id: i64, options: RecapOptions) {
        self.inner.lock().await.options.insert(chat_id, options);
    }

    pub async fn put_subscriber(&self, subscriber: Subscriber) {
        self.inner
            .lock()
            .await
            .subscribers
            .entry(subscriber.chat_id)
            .or_default()
            .push(subscriber);
    }

    pub async fn push_message(&self, chat_id: i64, message: ChatMessage) {
        self.inner
            .lock()
            .await
            .history
            .entry(chat_id)
            .or_default()
            .push(message);
    }

    /// All delivery records persisted so far, in insertion order.
    pub async fn sent_messages(&self) -> Vec<SentMessageRecord> {
        self.inner.lock().await.sent_messages.clone()
    }

    /// Every `unsubscribe` call observed, including repeats.
    pub async fn unsubscribe_calls(&self) -> Vec<(i64, i64)> {
        self.inner.lock().await.unsubscribe_calls.clone()
    }
}

#[async_trait]
impl RecapStore for MemoryStore {
    async fn recap_enabled(&self, chat_id: i64) -> Result<bool, RecapError> {
        let inner = self.inner.lock().await;
        Ok(inner.options.get(&chat_id).is_some_and(|o| o.enabled))
    }

    async fn recap_options(&self, chat_id: i64) -> Result<Option<RecapOptions>, RecapError> {
        let inner = self.inner.lock().await;
        Ok(inner.options.get(&chat_id).cloned())
    }

    async fn subscribers(&self, chat_id: i64) -> Result<Vec<Subscriber>, RecapError> {
        let inner = self.inner.lock().await;
        Ok(inner.subscribers.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn unsubscribe(&self, chat_id: i64, user_id: i64) -> Result<(), RecapError> {
        let mut inner = self.inner.lock().await;
        inner.unsubscribe_calls.push((chat_id, user_id));
        if let Some(subs) = inner.subscribers.get_mut(&chat_id) {
            subs.retain(|s| s.user_id != user_id);
        }
        Ok(())
    }

    async fn history_window(
        &self,
        chat_id: i64,
        hours: u32,
    ) -> Result<Vec<ChatMessage>, RecapError> {
        let horizon = Utc::now() - Duration::hours(i64::from(hours));
        let inner = self.inner.lock().await;
        Ok(inner
            .history
            .get(&chat_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.sent_at >= horizon)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_sent_message(&self, record: SentMessageRecord) -> Result<(), RecapError> {
        self.inner.lock().await.sent_messages.push(record);
        Ok(())
    }

    async fn last_pinned_message(
        &self,
        chat_id: i64,
    ) -> Result<Option<SentMessageRecord>, RecapError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sent_messages
            .iter()
            .rev()
            .find(|r| r.chat_id == chat_id && r.pinned)
            .copied())
    }

    async fn set_message_pinned(
        &self,
        chat_id: i64,
        message_id: i64,
        pinned: bool,
    ) -> Result<(), RecapError> {
        let mut inner = self.inner.lock().await;
        for record in inner
            .sent_messages
            .iter_mut()
            .filter(|r| r.chat_id == chat_id && r.message_id == message_id)
        {
            record.pinned = pinned;
        }
        Ok(())
    }
}
