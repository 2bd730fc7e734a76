/// autorecap - a scheduled chat-recap pipeline for group chats.
///
/// This crate implements the recurring recap pipeline as a library:
/// 1. A self-rearming scheduler fires per chat and loads options/subscribers
/// 2. A summarization orchestrator turns the history window into topic
///    summaries and a condensed one-line highlight
/// 3. A paginating publisher turns the recap document into one or more
///    Telegraph pages under the platform's byte budget
/// 4. A fan-out step delivers the page links to the group and to private
///    subscribers, revalidating membership and rotating the pinned message
///
/// # Architecture
///
/// The system uses:
/// - Tokio for the async runtime and the bounded worker pool
/// - reqwest for the Telegram Bot API, Telegraph API and OpenAI API
/// - governor for the shared outbound send limiter
/// - tokio-retry for bounded retries against the external services
///
/// The three external services are consumed through narrow traits
/// (`ChatApi`, `PageApi`, `LlmApi`) so the pipeline can be exercised
/// end-to-end without the network; the option/subscriber store is a trait
/// (`RecapStore`) with an in-memory reference implementation.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use autorecap::ai::LlmClient;
/// use autorecap::core::config::AppConfig;
/// use autorecap::recap::{RecapPipeline, scheduler::RecapScheduler};
/// use autorecap::store::memory::MemoryStore;
/// use autorecap::telegram::TelegramClient;
/// use autorecap::telegraph::TelegraphClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     autorecap::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let store = Arc::new(MemoryStore::new());
///     let chat_api = Arc::new(TelegramClient::new(&config));
///     let page_api = Arc::new(TelegraphClient::new(&config));
///     let llm = Arc::new(
///         LlmClient::new(
///             config.openai_api_key.clone(),
///             config.openai_org_id.clone(),
///             config.openai_model.clone().unwrap_or_else(|| "gpt-4o".to_string()),
///         )
///         .with_timeout(Duration::from_secs(config.llm_timeout_secs.unwrap_or(120))),
///     );
///
///     let pipeline = Arc::new(RecapPipeline::new(chat_api, page_api, llm, store.clone(), &config));
///     let scheduler = Arc::new(RecapScheduler::new(store, pipeline, &config));
///
///     // One schedule call per managed chat; every firing re-arms itself.
///     scheduler.schedule(-1001234567890, Duration::from_secs(6 * 3600));
///
///     std::future::pending::<()>().await;
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod recap;
pub mod store;
pub mod telegram;
pub mod telegraph;
pub mod utils;

pub use errors::RecapError;

/// Configure structured logging for a host process embedding the pipeline.
///
/// Sets up tracing-subscriber with an env-filter (`RUST_LOG`) and a compact
/// formatter. Call once at host startup.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
