//! Scheduler behavior under paused time: firing, skipping and the
//! always-reschedule guarantee.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use autorecap::core::models::{RecapOptions, SendMode, Subscriber};
use autorecap::errors::RecapError;
use autorecap::recap::scheduler::{RecapRunner, RecapScheduler};
use autorecap::store::memory::MemoryStore;

use common::test_config;

const CHAT_ID: i64 = -1009999;

struct CountingRunner {
    calls: Mutex<Vec<i64>>,
    fail: bool,
}

impl CountingRunner {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail,
        })
    }

    async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl RecapRunner for CountingRunner {
    async fn run(
        &self,
        chat_id: i64,
        _options: RecapOptions,
        _subscribers: Vec<Subscriber>,
    ) -> Result<(), RecapError> {
        self.calls.lock().await.push(chat_id);
        if self.fail {
            return Err(RecapError::ChatApi("simulated run failure".to_string()));
        }
        Ok(())
    }
}

fn enabled_options() -> RecapOptions {
    RecapOptions {
        enabled: true,
        send_mode: SendMode::Publicly,
        rates_per_day: 4,
        pin_enabled: false,
    }
}

/// Let spawned tasks catch up after advancing the clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_capsule_fires_after_delay_and_rearms() {
    let store = Arc::new(MemoryStore::new());
    store.put_options(CHAT_ID, enabled_options()).await;
    let runner = CountingRunner::new(false);
    let scheduler = Arc::new(RecapScheduler::new(
        Arc::clone(&store),
        runner.clone(),
        &test_config(),
    ));

    scheduler.schedule(CHAT_ID, Duration::from_secs(60));

    tokio::time::sleep(Duration::from_secs(59)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 0, "fired before its delay");

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 1);

    // rates_per_day = 4 re-arms the capsule 6 hours out.
    tokio::time::sleep(Duration::from_secs(6 * 3600 + 5)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_run_still_reschedules() {
    let store = Arc::new(MemoryStore::new());
    store.put_options(CHAT_ID, enabled_options()).await;
    let runner = CountingRunner::new(true);
    let scheduler = Arc::new(RecapScheduler::new(
        Arc::clone(&store),
        runner.clone(),
        &test_config(),
    ));

    scheduler.schedule(CHAT_ID, Duration::from_secs(1));

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 1);

    tokio::time::sleep(Duration::from_secs(6 * 3600 + 5)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 2, "error must not stop the cycle");
}

#[tokio::test(start_paused = true)]
async fn test_disabled_chat_skips_run_but_keeps_cycle() {
    let store = Arc::new(MemoryStore::new());
    store
        .put_options(
            CHAT_ID,
            RecapOptions {
                enabled: false,
                ..enabled_options()
            },
        )
        .await;
    let runner = CountingRunner::new(false);
    let scheduler = Arc::new(RecapScheduler::new(
        Arc::clone(&store),
        runner.clone(),
        &test_config(),
    ));

    scheduler.schedule(CHAT_ID, Duration::from_secs(1));

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 0);

    // Re-enabling between firings proves the capsule kept cycling.
    store.put_options(CHAT_ID, enabled_options()).await;
    tokio::time::sleep(Duration::from_secs(6 * 3600 + 5)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_private_only_without_subscribers_skips_run() {
    let store = Arc::new(MemoryStore::new());
    store
        .put_options(
            CHAT_ID,
            RecapOptions {
                send_mode: SendMode::OnlyPrivateSubscriptions,
                ..enabled_options()
            },
        )
        .await;
    let runner = CountingRunner::new(false);
    let scheduler = Arc::new(RecapScheduler::new(
        Arc::clone(&store),
        runner.clone(),
        &test_config(),
    ));

    scheduler.schedule(CHAT_ID, Duration::from_secs(1));

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 0);

    // A subscriber arriving before the next firing unblocks the run.
    store
        .put_subscriber(Subscriber {
            chat_id: CHAT_ID,
            user_id: 7,
        })
        .await;
    tokio::time::sleep(Duration::from_secs(6 * 3600 + 5)).await;
    settle().await;
    assert_eq!(runner.call_count().await, 1);
}
