//! Shared fakes for the integration tests: in-memory stand-ins for the
//! chat platform, the publishing platform and the language model.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use autorecap::ai::LlmApi;
use autorecap::core::config::AppConfig;
use autorecap::core::models::{ChatInfo, ChatKind, MemberStatus};
use autorecap::errors::RecapError;
use autorecap::telegram::ChatApi;
use autorecap::telegraph::PageApi;

pub fn test_config() -> AppConfig {
    AppConfig {
        telegram_bot_token: "123456:test-token".to_string(),
        telegram_api_url: None,
        telegraph_access_token: "telegraph-token".to_string(),
        telegraph_api_url: None,
        telegraph_author_name: None,
        openai_api_key: "openai-key".to_string(),
        openai_org_id: None,
        openai_model: Some("gpt-4o".to_string()),
        max_concurrent_runs: None,
        sends_per_second: None,
        llm_timeout_secs: None,
    }
}

#[derive(Default)]
struct ChatState {
    next_message_id: i64,
    sent: Vec<(i64, String)>,
    pinned: Vec<(i64, i64)>,
    unpinned: Vec<(i64, i64)>,
}

pub struct FakeChatApi {
    chat: ChatInfo,
    state: Mutex<ChatState>,
    member_statuses: Mutex<HashMap<i64, MemberStatus>>,
    failing_chats: Mutex<HashSet<i64>>,
    failing_member_checks: Mutex<HashSet<i64>>,
}

impl FakeChatApi {
    pub fn new(chat_id: i64, title: &str, kind: ChatKind) -> Self {
        Self {
            chat: ChatInfo {
                id: chat_id,
                title: title.to_string(),
                kind,
            },
            state: Mutex::new(ChatState {
                next_message_id: 100,
                ..ChatState::default()
            }),
            member_statuses: Mutex::new(HashMap::new()),
            failing_chats: Mutex::new(HashSet::new()),
            failing_member_checks: Mutex::new(HashSet::new()),
        }
    }

    pub async fn set_member_status(&self, user_id: i64, status: MemberStatus) {
        self.member_statuses.lock().await.insert(user_id, status);
    }

    /// Make every send to `chat_id` fail with a transient error.
    pub async fn fail_sends_to(&self, chat_id: i64) {
        self.failing_chats.lock().await.insert(chat_id);
    }

    /// Make the membership lookup for `user_id` fail with a transient error.
    pub async fn fail_member_check_for(&self, user_id: i64) {
        self.failing_member_checks.lock().await.insert(user_id);
    }

    /// Every message sent so far, as `(chat_id, text)` in send order.
    pub async fn sent(&self) -> Vec<(i64, String)> {
        self.state.lock().await.sent.clone()
    }

    /// Messages sent to one chat.
    pub async fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub async fn pinned(&self) -> Vec<(i64, i64)> {
        self.state.lock().await.pinned.clone()
    }

    pub async fn unpinned(&self) -> Vec<(i64, i64)> {
        self.state.lock().await.unpinned.clone()
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<i64, RecapError> {
        if self.failing_chats.lock().await.contains(&chat_id) {
            return Err(RecapError::ChatApi(format!(
                "sendMessage error: chat {chat_id} unavailable"
            )));
        }
        let mut state = self.state.lock().await;
        state.next_message_id += 1;
        let message_id = state.next_message_id;
        state.sent.push((chat_id, html.to_string()));
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        _chat_id: i64,
        _message_id: i64,
        _html: &str,
    ) -> Result<(), RecapError> {
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i64) -> Result<(), RecapError> {
        Ok(())
    }

    async fn pin_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError> {
        self.state.lock().await.pinned.push((chat_id, message_id));
        Ok(())
    }

    async fn unpin_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError> {
        self.state.lock().await.unpinned.push((chat_id, message_id));
        Ok(())
    }

    async fn get_chat(&self, _chat_id: i64) -> Result<ChatInfo, RecapError> {
        Ok(self.chat.clone())
    }

    async fn get_chat_member(
        &self,
        _chat_id: i64,
        user_id: i64,
    ) -> Result<MemberStatus, RecapError> {
        if self.failing_member_checks.lock().await.contains(&user_id) {
            return Err(RecapError::ChatApi(
                "getChatMember error: timed out".to_string(),
            ));
        }
        Ok(self
            .member_statuses
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or(MemberStatus::Member))
    }
}

#[derive(Default)]
pub struct FakePageApi {
    pages: Mutex<Vec<(String, String)>>,
    edits: Mutex<Vec<(String, String, String)>>,
    fail_creates: Mutex<bool>,
    fail_edits: Mutex<bool>,
}

impl FakePageApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_creates(&self, fail: bool) {
        *self.fail_creates.lock().await = fail;
    }

    pub async fn set_fail_edits(&self, fail: bool) {
        *self.fail_edits.lock().await = fail;
    }

    /// Created pages as `(title, html)` in creation order.
    pub async fn pages(&self) -> Vec<(String, String)> {
        self.pages.lock().await.clone()
    }

    /// Edits as `(url, title, html)` in call order.
    pub async fn edits(&self) -> Vec<(String, String, String)> {
        self.edits.lock().await.clone()
    }
}

#[async_trait]
impl PageApi for FakePageApi {
    async fn create_page(&self, title: &str, html: &str) -> Result<String, RecapError> {
        if *self.fail_creates.lock().await {
            return Err(RecapError::Publish("createPage error: FLOOD_WAIT".to_string()));
        }
        let mut pages = self.pages.lock().await;
        pages.push((title.to_string(), html.to_string()));
        Ok(format!("https://telegra.ph/test-page-{}", pages.len()))
    }

    async fn edit_page(&self, url: &str, title: &str, html: &str) -> Result<String, RecapError> {
        if *self.fail_edits.lock().await {
            return Err(RecapError::Publish("editPage error: PAGE_SAVE_FAILED".to_string()));
        }
        self.edits
            .lock()
            .await
            .push((url.to_string(), title.to_string(), html.to_string()));
        Ok(url.to_string())
    }
}

pub struct FakeLlm {
    topics: Result<Vec<String>, String>,
    condensed: Result<String, String>,
}

impl FakeLlm {
    pub fn new(topics: Result<Vec<String>, String>, condensed: Result<String, String>) -> Self {
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
