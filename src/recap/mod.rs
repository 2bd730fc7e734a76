//! The recap pipeline: scheduler, summarization orchestrator, document
//! rendering, publishing and fan-out delivery, tied together per run.

pub mod deliver;
pub mod scheduler;
pub mod summarizer;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::ai::LlmApi;
use crate::core::config::AppConfig;
use crate::core::models::{PageSeries, RecapOptions, Subscriber};
use crate::errors::RecapError;
use crate::store::RecapStore;
use crate::telegram::ChatApi;
use crate::telegram::formatter::{escape_html, split_into_message_batches};
use crate::telegraph::{PageApi, TelegraphPublisher};
use crate::utils::filters::filter_history_messages;
use crate::utils::rate_limit::{DEFAULT_SENDS_PER_SECOND, new_send_limiter};

// Re-export main types for convenience
pub use deliver::Deliverer;
pub use scheduler::{RecapRunner, RecapScheduler};
pub use summarizer::Summarizer;

const DEFAULT_MODEL_NAME: &str = "gpt-4o";

/// One fully wired recap pipeline. The generics are the three external
/// services and the store, so hosts wire the real clients and tests wire
/// fakes.
pub struct RecapPipeline<C, P, L, S> {
    chat_api: Arc<C>,
    publisher: TelegraphPublisher<P>,
    summarizer: Summarizer<L>,
    deliverer: Deliverer<C, S>,
    store: Arc<S>,
    model_name: String,
}

impl<C: ChatApi, P: PageApi, L: LlmApi, S: RecapStore> RecapPipeline<C, P, L, S> {
    #[must_use]
    pub fn new(
        chat_api: Arc<C>,
        page_api: Arc<P>,
        llm: Arc<L>,
        store: Arc<S>,
        config: &AppConfig,
    ) -> Self {
        let limiter = new_send_limiter(
            config
                .sends_per_second
                .unwrap_or(DEFAULT_SENDS_PER_SECOND),
        );
        let model_name = config
            .openai_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

        Self {
            chat_api: Arc::clone(&chat_api),
            publisher: TelegraphPublisher::new(page_api),
            summarizer: Summarizer::new(llm),
            deliverer: Deliverer::new(chat_api, Arc::clone(&store), limiter, model_name.clone()),
            store,
            model_name,
        }
    }

    /// Override the per-page byte budget of the publisher (tests exercise
    /// pagination with small budgets).
    #[must_use]
    pub fn with_page_byte_budget(mut self, byte_budget: usize) -> Self {
        self.publisher = self.publisher.with_byte_budget(byte_budget);
        self
    }
}

#[async_trait]
impl<C, P, L, S> RecapRunner for RecapPipeline<C, P, L, S>
where
    C: ChatApi,
    P: PageApi,
    L: LlmApi,
    S: RecapStore,
{
    async fn run(
        &self,
        chat_id: i64,
        options: RecapOptions,
        subscribers: Vec<Subscriber>,
    ) -> Result<(), RecapError> {
        info!(
            chat_id,
            rates_per_day = options.rates_per_day,
            "generating chat recap"
        );

        let chat = self.chat_api.get_chat(chat_id).await?;
        let hours = options.window_hours();

        let window = self.store.history_window(chat_id, hours).await?;
        let window = filter_history_messages(window);

        let summarization = match self.summarizer.summarize(chat_id, &window).await {
            Ok(summarization) => summarization,
            Err(e) if e.is_skip() => {
                warn!(chat_id, "skipping recap run: {e}");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        info!(
            chat_id,
            log_id = %summarization.log_id,
            topics = summarization.topics.len(),
            "summarization complete"
        );

        let condensed = self
            .summarizer
            .condense(chat_id, &window, &summarization.topics, hours)
            .await;

        let batches = split_into_message_batches(&summarization.topics);
        let title = page_title(&chat.title, hours);
        let generated_at = Utc::now().format("%Y/%m/%d %H:%M:%S").to_string();

        let mut published: Vec<PageSeries> = Vec::with_capacity(batches.len());
        for (i, batch) in batches.iter().enumerate() {
            let html = render_document_html(batch, hours, &generated_at, &self.model_name);
            let batch_title = if batches.len() > 1 {
                format!("{title} ({}/{})", i + 1, batches.len())
            } else {
                title.clone()
            };

            match self.publisher.publish_document(&batch_title, &html).await {
                Ok(series) => published.push(series),
                Err(e) => {
                    error!(
                        chat_id,
                        batch = i + 1,
                        total_batches = batches.len(),
                        "failed to publish recap batch: {e}"
                    );
                }
            }
        }

        if published.is_empty() {
            return Err(RecapError::Publish(
                "no recap pages were created".to_string(),
            ));
        }

        self.deliverer
            .deliver(&chat, &options, &subscribers, &published, &condensed)
            .await
    }
}

/// The published page title for one run.
#[must_use]
pub fn page_title(chat_title: &str, hours: u32) -> String {
    format!("[{chat_title}] recap of the last {hours} hours")
}

/// Render topic blocks into the page document: a window header, one
/// heading-plus-paragraph section per topic and an attribution footer.
#[must_use]
pub fn render_document_html(
    topics: &[String],
    hours: u32,
    generated_at: &str,
    model_name: &str,
) -> String {
    let mut html = format!(
        "<p><small>Covering the {hours} hours before {generated_at}.</small></p><hr>"
    );

    for topic in topics {
        let mut paragraph_lines: Vec<String> = Vec::new();
        for line in topic.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(heading) = line.strip_prefix("##") {
                if !paragraph_lines.is_empty() {
                    html.push_str(&format!("<p>{}</p>", paragraph_lines.join("<br>")));
                    paragraph_lines.clear();
                }
                html.push_str(&format!(
                    "<h3>{}</h3>",
                    escape_html(heading.trim_start_matches('#').trim())
                ));
            } else {
                paragraph_lines.push(escape_html(line));
            }
        }
        if !paragraph_lines.is_empty() {
            html.push_str(&format!("<p>{}</p>", paragraph_lines.join("<br>")));
        }
    }

    html.push_str(&format!(
        "<hr><p><em>Generated by {}</em></p>",
        escape_html(model_name)
    ));
    html
}
