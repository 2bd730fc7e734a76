//! Telegram Bot API client module
//!
//! Encapsulates all Bot API interactions with retry logic and error handling.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};

use crate::core::config::AppConfig;
use crate::core::models::{ChatInfo, ChatKind, MemberStatus};
use crate::errors::RecapError;
use crate::telegram::ChatApi;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Bot API client with retry logic and error handling
pub struct TelegramClient {
    token: String,
    api_url: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            token: config.telegram_bot_token.clone(),
            api_url: config
                .telegram_api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.token,
            method
        )
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, RecapError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, RecapError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        Retry::spawn(strategy, operation).await
    }

    /// POST one Bot API method and return the `result` field of the
    /// response envelope.
    async fn call_method(&self, method: &str, payload: &Value) -> Result<Value, RecapError> {
        let resp = HTTP_CLIENT
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| RecapError::Http(format!("{method} request failed: {e}")))?;

        // Error responses still carry the {ok, description} envelope, so
        // parse the body before deciding on the HTTP status.
        let status = resp.status();
        let body: Value = resp.json().await.map_err(|e| {
            if status.is_success() {
                RecapError::Parse(format!("{method} JSON parse error: {e}"))
            } else {
                RecapError::ChatApi(format!("{method} HTTP {status}"))
            }
        })?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            return Err(RecapError::ChatApi(format!(
                "{method} error: {}",
                body.get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
            )));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<i64, RecapError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": html,
            "parse_mode": "HTML",
        });

        self.with_retry(|| async {
            let result = self.call_method("sendMessage", &payload).await?;

            result
                .get("message_id")
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    RecapError::Parse("sendMessage: no message_id in response".to_string())
                })
        })
        .await
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        html: &str,
    ) -> Result<(), RecapError> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": html,
            "parse_mode": "HTML",
        });

        self.with_retry(|| async {
            self.call_method("editMessageText", &payload).await?;
            Ok(())
        })
        .await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });

        self.with_retry(|| async {
            self.call_method("deleteMessage", &payload).await?;
            Ok(())
        })
        .await
    }

    async fn pin_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "disable_notification": true,
        });

        self.with_retry(|| async {
            self.call_method("pinChatMessage", &payload).await?;
            Ok(())
        })
        .await
    }

    async fn unpin_message(&self, chat_id: i64, message_id: i64) -> Result<(), RecapError> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });

        self.with_retry(|| async {
            self.call_method("unpinChatMessage", &payload).await?;
            Ok(())
        })
        .await
    }

    async fn get_chat(&self, chat_id: i64) -> Result<ChatInfo, RecapError> {
        let payload = json!({ "chat_id": chat_id });

        self.with_retry(|| async {
            let result = self.call_method("getChat", &payload).await?;

            let kind = result
                .get("type")
                .and_then(Value::as_str)
                .map(ChatKind::parse)
                .unwrap_or(ChatKind::Unknown);
            let title = result
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            Ok(ChatInfo {
                id: chat_id,
                title,
                kind,
            })
        })
        .await
    }

    async fn get_chat_member(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<MemberStatus, RecapError> {
        let payload = json!({
            "chat_id": chat_id,
            "user_id": user_id,
        });

        self.with_retry(|| async {
            let result = self.call_method("getChatMember", &payload).await?;

            result
                .get("status")
                .and_then(Value::as_str)
                .map(MemberStatus::parse)
                .ok_or_else(|| {
                    RecapError::Parse("getChatMember: no status in response".to_string())
                })
        })
        .await
    }
}
