//! The self-rearming recap scheduler: one "time capsule" per chat that
//! fires, checks state, dispatches the heavy run onto a bounded pool and
//! always re-arms itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_retry::{Retry, strategy::FixedInterval};
use tracing::{debug, error, warn};

use crate::core::config::AppConfig;
use crate::core::models::{RecapOptions, SendMode, Subscriber};
use crate::errors::RecapError;
use crate::store::RecapStore;

/// Hard cap on concurrently executing recap runs, so one slow chat cannot
/// starve the others.
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 20;

/// Attempts for each of the three state reads done at firing time.
const READ_ATTEMPTS: usize = 10;
const READ_RETRY_DELAY: Duration = Duration::from_millis(500);

/// The heavy part of a firing (summarize, publish, deliver), injected into
/// the scheduler at construction.
#[async_trait]
pub trait RecapRunner: Send + Sync {
    async fn run(
        &self,
        chat_id: i64,
        options: RecapOptions,
        subscribers: Vec<Subscriber>,
    ) -> Result<(), RecapError>;
}

pub struct RecapScheduler<S> {
    store: Arc<S>,
    runner: Arc<dyn RecapRunner>,
    pool: Arc<Semaphore>,
    default_interval: Duration,
}

impl<S: RecapStore + 'static> RecapScheduler<S> {
    #[must_use]
    pub fn new(store: Arc<S>, runner: Arc<dyn RecapRunner>, config: &AppConfig) -> Self {
        let permits = config
            .max_concurrent_runs
            .unwrap_or(DEFAULT_MAX_CONCURRENT_RUNS);
        Self {
            store,
            runner,
            pool: Arc::new(Semaphore::new(permits)),
            default_interval: RecapOptions::default().interval(),
        }
    }

    /// Arm a capsule for `chat_id` that fires no earlier than `delay` from
    /// now. Every firing arms the next one, so one call per chat keeps the
    /// recap recurring.
    pub fn schedule(self: Arc<Self>, chat_id: i64, delay: Duration) {
        debug!(chat_id, delay_secs = delay.as_secs(), "arming recap capsule");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            self.on_fire(chat_id).await;
        });
    }

    /// Handle one firing. Rescheduling is armed by the guard on every exit
    /// path, including panics, before any outcome of the firing matters.
    pub async fn on_fire(self: Arc<Self>, chat_id: i64) {
        debug!(chat_id, "recap capsule fired");
        let mut guard = RescheduleGuard {
            scheduler: Arc::clone(&self),
            chat_id,
            next_delay: self.default_interval,
        };

        let enabled = self
            .read_with_retry("recap enabled flag", || async {
                self.store.recap_enabled(chat_id).await
            })
            .await;
        let options = self
            .read_with_retry("recap options", || async {
                self.store.recap_options(chat_id).await
            })
            .await;
        let subscribers = self
            .read_with_retry("recap subscribers", || async {
                self.store.subscribers(chat_id).await
            })
            .await;

        let (Ok(enabled), Ok(options), Ok(subscribers)) = (enabled, options, subscribers) else {
            error!(chat_id, "failed to load recap state, aborting this firing");
            return;
        };

        let options = options.unwrap_or_default();
        guard.next_delay = options.interval();

        if !enabled {
            debug!(chat_id, "recap disabled, skipping");
            return;
        }
        if options.send_mode == SendMode::OnlyPrivateSubscriptions && subscribers.is_empty() {
            debug!(
                chat_id,
                "send mode is private subscriptions only with no subscribers, skipping"
            );
            return;
        }

        let runner = Arc::clone(&self.runner);
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            let Ok(_permit) = pool.acquire_owned().await else {
                return;
            };
            if let Err(e) = runner.run(chat_id, options, subscribers).await {
                if e.is_skip() {
                    warn!(chat_id, "recap run skipped: {e}");
                } else {
                    error!(chat_id, "recap run failed: {e}");
                }
            }
        });
    }

    async fn read_with_retry<T, F, Fut>(&self, what: &str, operation: F) -> Result<T, RecapError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, RecapError>> + Send,
        T: Send,
    {
        let strategy = FixedInterval::new(READ_RETRY_DELAY).take(READ_ATTEMPTS - 1);

        Retry::spawn(strategy, operation).await.map_err(|e| {
            error!("failed to read {what}: {e}");
            e
        })
    }
}

/// Re-arms the chat's capsule when dropped, so rescheduling survives every
/// return path and unwinding alike.
struct RescheduleGuard<S: RecapStore + 'static> {
    scheduler: Arc<RecapScheduler<S>>,
    chat_id: i64,
    next_delay: Duration,
}

impl<S: RecapStore + 'static> Drop for RescheduleGuard<S> {
    fn drop(&mut self) {
        Arc::clone(&self.scheduler).schedule(self.chat_id, self.next_delay);
    }
}
