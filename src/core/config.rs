use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_api_url: Option<String>,
    pub telegraph_access_token: String,
    pub telegraph_api_url: Option<String>,
    pub telegraph_author_name: Option<String>,
    pub openai_api_key: String,
    pub openai_org_id: Option<String>,
    pub openai_model: Option<String>,
    /// Hard cap on concurrently executing recap runs.
    pub max_concurrent_runs: Option<usize>,
    /// Shared outbound send budget across all delivery targets.
    pub sends_per_second: Option<u32>,
    /// Wall-clock ceiling for a single language-model call, in seconds.
    pub llm_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|e| format!("TELEGRAM_BOT_TOKEN: {}", e))?,
            telegram_api_url: env::var("TELEGRAM_API_URL").ok(),
            telegraph_access_token: env::var("TELEGRAPH_ACCESS_TOKEN")
                .map_err(|e| format!("TELEGRAPH_ACCESS_TOKEN: {}", e))?,
            telegraph_api_url: env::var("TELEGRAPH_API_URL").ok(),
            telegraph_author_name: env::var("TELEGRAPH_AUTHOR_NAME").ok(),
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|e| format!("OPENAI_API_KEY: {}", e))?,
            openai_org_id: env::var("OPENAI_ORG_ID").ok(),
            openai_model: env::var("OPENAI_MODEL").ok(),
            max_concurrent_runs: env::var("RECAP_MAX_CONCURRENT_RUNS")
                .ok()
                .and_then(|v| v.parse().ok()),
            sends_per_second: env::var("RECAP_SENDS_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok()),
            llm_timeout_secs: env::var("RECAP_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        })
    }
}
