//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat-completion calls behind the [`LlmApi`] trait and
//! turns the model's JSON topic payload into renderable summary blocks.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::ai::LlmApi;
use crate::ai::prompt_builder::{build_condense_prompt, build_topic_prompt};
use crate::errors::RecapError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// One topic as returned by the model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub topic_name: String,
    #[serde(default)]
    pub since_id: Option<i64>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub discussion: Vec<DiscussionPoint>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionPoint {
    pub point: String,
    #[serde(default)]
    pub key_ids: Vec<i64>,
}

/// LLM API client for generating recaps
pub struct LlmClient {
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    timeout: Duration,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, org_id: Option<String>, model_name: String) -> Self {
        Self {
            api_key,
            org_id,
            model_name,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the wall-clock ceiling for a single model call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn chat_completion(
        &self,
        prompt: Vec<ChatCompletionMessage>,
    ) -> Result<String, RecapError> {
        info!(
            "Requesting completion with {} messages in prompt",
            prompt.len()
        );

        let messages: Vec<Value> = prompt
            .iter()
            .map(|m| {
                let role = match m.role {
                    MessageRole::system => "system",
                    MessageRole::assistant => "assistant",
                    MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                };
                let content = match &m.content {
                    Content::Text(t) => t.clone(),
                    _ => String::new(),
                };
                json!({ "role": role, "content": content })
            })
            .collect();

        let request_body = json!({
            "model": self.model_name,
            "messages": messages,
        });

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RecapError::Http(format!("Failed to build OpenAI HTTP client: {e}")))?;

        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| RecapError::Http(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        if let Some(org) = &self.org_id {
            let org_value = org
                .parse()
                .map_err(|e| RecapError::Http(format!("Invalid OpenAI-Organization header: {e}")))?;
            headers.insert("OpenAI-Organization", org_value);
        }

        let response = client
            .post("https://api.openai.com/v1/chat/completions")
            .headers(headers)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RecapError::Http(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(RecapError::Llm(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| RecapError::Llm(format!("Failed to parse OpenAI response: {e}")))?;

        response_json
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(std::string::ToString::to_string)
            .ok_or_else(|| RecapError::Llm("No text in response".to_string()))
    }
}

#[async_trait]
impl LlmApi for LlmClient {
    async fn summarize_topics(&self, transcript: &str) -> Result<Vec<String>, RecapError> {
        let raw = self.chat_completion(build_topic_prompt(transcript)).await?;
        let topics = parse_topic_payload(&raw)?;

        Ok(topics.iter().map(render_topic).collect())
    }

    async fn condense(&self, transcript: &str) -> Result<String, RecapError> {
        let raw = self
            .chat_completion(build_condense_prompt(transcript))
            .await?;

        Ok(raw.trim().to_string())
    }
}

/// Parse the model's topic payload, tolerating a markdown code fence around
/// the JSON array.
pub fn parse_topic_payload(raw: &str) -> Result<Vec<TopicSummary>, RecapError> {
    let json_slice = extract_json_array(raw)
        .ok_or_else(|| RecapError::Parse("no JSON array in topic response".to_string()))?;

    serde_json::from_str(json_slice)
        .map_err(|e| RecapError::Parse(format!("invalid topic payload: {e}")))
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Render one parsed topic into the plain-text block the rest of the
/// pipeline works with (markdown-style heading, participants line, bullet
/// points, optional conclusion).
#[must_use]
pub fn render_topic(topic: &TopicSummary) -> String {
    let mut block = format!("## {}", topic.topic_name.trim());

    if !topic.participants.is_empty() {
        block.push_str(&format!(
            "\nParticipants: {}",
            topic.participants.join(", ")
        ));
    }

    for point in &topic.discussion {
        if !point.point.trim().is_empty() {
            block.push_str(&format!("\n- {}", point.point.trim()));
        }
    }

    if let Some(conclusion) = topic.conclusion.as_deref()
        && !conclusion.trim().is_empty()
    {
        block.push_str(&format!("\nConclusion: {}", conclusion.trim()));
    }

    block
}
