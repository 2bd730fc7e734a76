//! Fan-out delivery: target resolution, membership revalidation, rate
//! limited sends and the pinned-message lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_retry::{Retry, strategy::FixedInterval};
use tracing::{error, info, warn};

use crate::core::models::{
    ChatInfo, ChatKind, DeliveryTarget, PageSeries, RecapOptions, SendMode, SentMessageRecord,
    Subscriber,
};
use crate::errors::RecapError;
use crate::store::RecapStore;
use crate::telegram::ChatApi;
use crate::telegram::formatter::escape_html;
use crate::utils::rate_limit::SendLimiter;

/// Bounded retry for the auto-unsubscribe write. Kept deliberately small;
/// the store either answers within a few attempts or the next run retries.
const UNSUBSCRIBE_ATTEMPTS: usize = 10;
const UNSUBSCRIBE_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct Deliverer<C, S> {
    chat_api: Arc<C>,
    store: Arc<S>,
    limiter: Arc<SendLimiter>,
    model_name: String,
}

impl<C: ChatApi, S: RecapStore> Deliverer<C, S> {
    #[must_use]
    pub fn new(
        chat_api: Arc<C>,
        store: Arc<S>,
        limiter: Arc<SendLimiter>,
        model_name: String,
    ) -> Self {
        Self {
            chat_api,
            store,
            limiter,
            model_name,
        }
    }

    /// Deliver every published batch to every resolved target. No single
    /// target's failure stops delivery to the others.
    pub async fn deliver(
        &self,
        chat: &ChatInfo,
        options: &RecapOptions,
        subscribers: &[Subscriber],
        batches: &[PageSeries],
        condensed: &str,
    ) -> Result<(), RecapError> {
        let targets = self.resolve_targets(chat, options, subscribers).await;
        if targets.is_empty() {
            info!(chat_id = chat.id, "no delivery targets resolved, nothing to send");
            return Ok(());
        }

        for (batch_index, series) in batches.iter().enumerate() {
            let content = render_batch_message(
                chat,
                series,
                condensed,
                batch_index,
                batches.len(),
                &self.model_name,
            );

            for target in &targets {
                self.limiter.until_ready().await;
                info!(
                    summarized_for_chat_id = chat.id,
                    sending_target_chat_id = target.chat_id(),
                    "sending chat recap"
                );

                let text = match target {
                    DeliveryTarget::GroupBroadcast(_) => content.clone(),
                    DeliveryTarget::PrivateSubscriber(_) => {
                        render_subscriber_message(&chat.title, &content)
                    }
                };

                let message_id = match self.chat_api.send_message(target.chat_id(), &text).await {
                    Ok(message_id) => message_id,
                    Err(e) => {
                        error!(
                            chat_id = chat.id,
                            target_chat_id = target.chat_id(),
                            "failed to send chat recap: {e}"
                        );
                        continue;
                    }
                };

                // Pinning applies to the group broadcast of the first batch
                // only; everything else is just recorded for later lookups.
                if batch_index == 0 && options.pin_enabled && target.is_group() {
                    self.rotate_pin(chat.id, message_id).await;
                } else {
                    self.record_sent(target.chat_id(), message_id, false).await;
                }
            }
        }

        Ok(())
    }

    /// Resolve the target set for this run: the group itself when the send
    /// mode is public, plus every subscriber whose membership still checks
    /// out. Candidates with revoked membership are unsubscribed and
    /// notified; candidates whose check fails stay subscribed but are
    /// skipped this run.
    pub async fn resolve_targets(
        &self,
        chat: &ChatInfo,
        options: &RecapOptions,
        subscribers: &[Subscriber],
    ) -> Vec<DeliveryTarget> {
        let mut targets = Vec::new();

        if options.send_mode == SendMode::Publicly {
            targets.push(DeliveryTarget::GroupBroadcast(chat.id));
        }

        for subscriber in subscribers {
            match self
                .chat_api
                .get_chat_member(chat.id, subscriber.user_id)
                .await
            {
                Ok(status) if status.allowed_for_delivery() => {
                    targets.push(DeliveryTarget::PrivateSubscriber(subscriber.user_id));
                }
                Ok(status) => {
                    warn!(
                        chat_id = chat.id,
                        user_id = subscriber.user_id,
                        ?status,
                        "subscriber is no longer a member, auto unsubscribing"
                    );
                    self.revoke_subscriber(chat, subscriber).await;
                }
                Err(e) => {
                    error!(
                        chat_id = chat.id,
                        user_id = subscriber.user_id,
                        "failed to get chat member, skipping subscriber this run: {e}"
                    );
                }
            }
        }

        targets
    }

    /// Drop a revoked subscriber: remove the subscription with bounded
    /// retry and send a one-off removal notice. Best-effort; never fails
    /// the run.
    async fn revoke_subscriber(&self, chat: &ChatInfo, subscriber: &Subscriber) {
        let strategy = FixedInterval::new(UNSUBSCRIBE_RETRY_DELAY).take(UNSUBSCRIBE_ATTEMPTS - 1);
        let result = Retry::spawn(strategy, || async {
            self.store
                .unsubscribe(subscriber.chat_id, subscriber.user_id)
                .await
        })
        .await;

        if let Err(e) = result {
            error!(
                chat_id = subscriber.chat_id,
                user_id = subscriber.user_id,
                "failed to auto unsubscribe: {e}"
            );
        }

        self.limiter.until_ready().await;
        let notice = render_removal_notice(&chat.title);
        if let Err(e) = self.chat_api.send_message(subscriber.user_id, &notice).await {
            error!(
                chat_id = subscriber.chat_id,
                user_id = subscriber.user_id,
                "failed to send the auto un-subscription notice: {e}"
            );
        }
    }

    /// Unpin the previously recorded pinned message, pin the new one and
    /// persist the transition. The single-pinned-record invariant holds
    /// even when the platform calls fail: the old record is always marked
    /// non-pinned before the new one can be marked pinned.
    async fn rotate_pin(&self, chat_id: i64, message_id: i64) {
        let previous = match self.store.last_pinned_message(chat_id).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(chat_id, "pin lookup failed, skipping the pin step this run: {e}");
                self.record_sent(chat_id, message_id, false).await;
                return;
            }
        };

        if let Some(previous) = previous {
            if let Err(e) = self
                .chat_api
                .unpin_message(previous.chat_id, previous.message_id)
                .await
            {
                error!(
                    chat_id,
                    message_id = previous.message_id,
                    "failed to unpin chat message: {e}"
                );
            }
            if let Err(e) = self
                .store
                .set_message_pinned(previous.chat_id, previous.message_id, false)
                .await
            {
                error!(
                    chat_id,
                    message_id = previous.message_id,
                    "failed to mark previous pinned message stale: {e}"
                );
            }
        }

        let pinned = match self.chat_api.pin_message(chat_id, message_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(chat_id, message_id, "failed to pin chat message: {e}");
                false
            }
        };

        self.record_sent(chat_id, message_id, pinned).await;
    }

    async fn record_sent(&self, chat_id: i64, message_id: i64, pinned: bool) {
        let record = SentMessageRecord {
            chat_id,
            message_id,
            pinned,
        };
        if let Err(e) = self.store.save_sent_message(record).await {
            error!(chat_id, message_id, "failed to save sent message record: {e}");
        }
    }
}

/// The group/subscriber message for one batch: canonical link, per-page
/// links for multi-page series, the condensed highlight and attribution.
#[must_use]
pub fn render_batch_message(
    chat: &ChatInfo,
    series: &PageSeries,
    condensed: &str,
    batch_index: usize,
    batch_count: usize,
    model_name: &str,
) -> String {
    let mut multi_page_info = String::new();
    if series.urls().len() > 1 {
        multi_page_info.push_str(&format!(
            "\n\n<b>Note:</b> this recap is long, so it spans {} pages:",
            series.urls().len()
        ));
        for (i, url) in series.urls().iter().enumerate() {
            multi_page_info.push_str(&format!("\n- <a href=\"{url}\">Part {}</a>", i + 1));
        }
    }

    // Plain (non-super) groups cannot resolve message link references.
    let tip = if chat.kind == ChatKind::Group {
        "<b>Tips:</b> message link references are unavailable because this group is not a supergroup; upgrading the group restores them.\n\n"
    } else {
        ""
    };

    let mut content = format!(
        "📝 <b>Chat recap published</b>: <a href=\"{}\">{}</a>{}\n\n<b>Highlights:</b>\n{}\n\n{}#recap #recap_auto\n🤖 Generated by {}",
        series.canonical_url(),
        escape_html(&chat.title),
        multi_page_info,
        condensed,
        tip,
        model_name,
    );

    if batch_count > 1 {
        content.push_str(&format!(" ({}/{})", batch_index + 1, batch_count));
    }

    content
}

/// Preamble wrapping for private subscribers.
#[must_use]
pub fn render_subscriber_message(chat_title: &str, content: &str) -> String {
    format!(
        "Hello! Here is the scheduled recap of <b>{}</b> you subscribed to.\n\n{}",
        escape_html(chat_title),
        content
    )
}

/// One-off notice sent when a subscriber is auto-removed.
#[must_use]
pub fn render_removal_notice(chat_title: &str) -> String {
    format!(
        "Since you are no longer a member of <b>{}</b>, your subscription to its chat recaps has been cancelled automatically.",
        escape_html(chat_title)
    )
}
