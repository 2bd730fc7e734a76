//! Publishing platform API client module
//!
//! Encapsulates page creation and editing with bounded retry and inter-call
//! throttling.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_retry::{Retry, strategy::FixedInterval};
use url::Url;

use crate::core::config::AppConfig;
use crate::errors::RecapError;
use crate::telegraph::nodes;

const DEFAULT_API_URL: &str = "https://api.telegra.ph";

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
/// Minimum spacing between consecutive page calls. Burst creation is known
/// to get the access token invalidated by the platform.
const PAGE_CALL_INTERVAL: Duration = Duration::from_secs(2);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// The narrow publishing contract the pipeline consumes.
#[async_trait]
pub trait PageApi: Send + Sync {
    /// Create a page; returns its public URL.
    async fn create_page(&self, title: &str, html: &str) -> Result<String, RecapError>;

    /// Replace the title and content of an existing page, addressed by URL
    /// or path; returns the page URL.
    async fn edit_page(&self, url: &str, title: &str, html: &str) -> Result<String, RecapError>;
}

/// Publishing API client with bounded retry and global call throttling.
pub struct TelegraphClient {
    access_token: String,
    api_url: String,
    author_name: Option<String>,
    last_call: Mutex<Option<Instant>>,
}

impl TelegraphClient {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            access_token: config.telegraph_access_token.clone(),
            api_url: config
                .telegraph_api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            author_name: config.telegraph_author_name.clone(),
            last_call: Mutex::new(None),
        }
    }

    /// Enforce the minimum inter-call interval across every caller sharing
    /// this client. The lock is held through the sleep so concurrent runs
    /// queue up behind it.
    async fn throttle(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < PAGE_CALL_INTERVAL {
                tokio::time::sleep(PAGE_CALL_INTERVAL - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }

    async fn call_method(&self, method: &str, payload: &Value) -> Result<String, RecapError> {
        let resp = HTTP_CLIENT
            .post(format!("{}/{method}", self.api_url.trim_end_matches('/')))
            .json(payload)
            .send()
            .await
            .map_err(|e| RecapError::Http(format!("{method} request failed: {e}")))?;

        let status = resp.status();
        let body: Value = resp.json().await.map_err(|e| {
            if status.is_success() {
                RecapError::Parse(format!("{method} JSON parse error: {e}"))
            } else {
                RecapError::Publish(format!("{method} HTTP {status}"))
            }
        })?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            return Err(RecapError::Publish(format!(
                "{method} error: {}",
                body.get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
            )));
        }

        body.get("result")
            .and_then(|r| r.get("url"))
            .and_then(Value::as_str)
            .map(std::string::ToString::to_string)
            .ok_or_else(|| RecapError::Parse(format!("{method}: no url in response")))
    }

    fn base_payload(&self, title: &str, html: &str) -> Result<Value, RecapError> {
        let content = nodes::html_to_nodes(html)?;
        let mut payload = json!({
            "access_token": self.access_token,
            "title": title,
            "content": content,
            "return_content": false,
        });
        if let Some(author) = &self.author_name {
            payload["author_name"] = Value::String(author.clone());
        }
        Ok(payload)
    }

    fn ensure_token(&self) -> Result<(), RecapError> {
        if self.access_token.is_empty() {
            return Err(RecapError::Publish(
                "access token is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reduce a page URL to the path the edit API expects.
#[must_use]
pub fn page_path(url_or_path: &str) -> String {
    match Url::parse(url_or_path) {
        Ok(url) => url.path().trim_start_matches('/').to_string(),
        Err(_) => url_or_path.trim_start_matches('/').to_string(),
    }
}

#[async_trait]
impl PageApi for TelegraphClient {
    async fn create_page(&self, title: &str, html: &str) -> Result<String, RecapError> {
        self.ensure_token()?;
        let payload = self.base_payload(title, html)?;

        self.throttle().await;

        let strategy = FixedInterval::new(RETRY_DELAY).take(MAX_RETRIES - 1);
        Retry::spawn(strategy, || async {
            self.call_method("createPage", &payload).await
        })
        .await
    }

    async fn edit_page(&self, url: &str, title: &str, html: &str) -> Result<String, RecapError> {
        self.ensure_token()?;
        let mut payload = self.base_payload(title, html)?;
        payload["path"] = Value::String(page_path(url));

        self.throttle().await;

        let strategy = FixedInterval::new(RETRY_DELAY).take(MAX_RETRIES - 1);
        Retry::spawn(strategy, || async {
            self.call_method("editPage", &payload).await
        })
        .await
    }
}
