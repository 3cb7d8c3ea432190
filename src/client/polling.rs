use crate::client::ClientInner;
use crate::core::models::Event;
use crate::query;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owns the repeating timer of a client. At most one timer is live.
#[derive(Debug, Default)]
pub struct PollScheduler {
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_polling(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// Cancels any running timer, queries once, then queries again every
    /// interval.
    pub(crate) fn start(&self, client: &Arc<ClientInner>) {
        self.stop(client);

        client.emit(Event::Start);
        query::run_once(client);

        let period = client.interval();
        let first_tick = Instant::now() + period;
        let handle = client
            .runtime
            .spawn(tick_loop(Arc::downgrade(client), first_tick, period));

        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }

        tracing::info!(interval_ms = period.as_millis() as u64, "Polling started");
    }

    /// Cancels the timer. Returns `false`, without emitting `stop`, when no
    /// timer was running. In-flight requests are left to finish.
    pub(crate) fn stop(&self, client: &ClientInner) -> bool {
        let Some(handle) = self.timer.lock().take() else {
            return false;
        };
        handle.abort();

        tracing::info!("Polling stopped");
        client.emit(Event::Stop);
        true
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}

async fn tick_loop(client: Weak<ClientInner>, first_tick: Instant, period: Duration) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(client) = client.upgrade() else {
            break;
        };
        query::run_once(&client);
    }
}
