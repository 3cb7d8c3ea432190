//! The polling client facade.

mod pending;
mod polling;

pub use pending::PendingTracker;
pub use polling::PollScheduler;

use crate::core::error::{ClientError, ValidationError};
use crate::core::events::{EventBus, ListenerId};
use crate::core::models::{ErrorEvent, Event, EventKind, Options, RequestId, Tag};
use crate::core::settings::{self, Settings, API_VERSION, DEFAULT_INTERVAL};
use crate::query;
use crate::transport::{HttpInventory, InstanceInventory};
use chrono::Utc;
use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Construction-time constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Polling interval used when the options do not set one.
    pub default_interval: Duration,
    pub api_version: String,
    /// Inventory gateway used by [`Client::connect`].
    pub endpoint: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_interval: DEFAULT_INTERVAL,
            api_version: API_VERSION.to_string(),
            endpoint: None,
        }
    }
}

impl From<&Settings> for ClientConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            default_interval: settings.default_interval(),
            api_version: settings.api_version.clone(),
            endpoint: settings.endpoint.clone(),
        }
    }
}

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn InstanceInventory>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) runtime: Handle,
    region: Option<String>,
    interval: Mutex<Duration>,
    next_request_id: AtomicU64,
    scheduler: PollScheduler,
    pending: PendingTracker,
    bus: EventBus,
    /// Serializes emission so a pending-set update and its `pending` event
    /// reach listeners as one unit. Re-entrant for listeners that emit.
    emitting: ReentrantMutex<()>,
}

impl ClientInner {
    pub(crate) fn next_request_id(&self) -> RequestId {
        self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn interval(&self) -> Duration {
        *self.interval.lock()
    }

    /// Publishes `event`. `init` and `end` update the pending set before
    /// listeners run and are followed by a `pending` event.
    pub(crate) fn emit(&self, event: Event) {
        let _emitting = self.emitting.lock();

        let pending = match &event {
            Event::Init(r) => Some(self.pending.track(r.request_id)),
            Event::End(r) => Some(self.pending.release(r.request_id)),
            _ => None,
        };

        self.bus.emit(&event);

        if let Some(count) = pending {
            self.bus.emit(&Event::Pending { count });
        }
    }

    fn start(self: &Arc<Self>) {
        self.scheduler.start(self);
    }
}

/// Polls an inventory endpoint for running instances and publishes the
/// lifecycle of every query as [`Event`]s.
///
/// Cloning a `Client` yields another handle to the same client. The timer
/// stops when the last handle is dropped; requests already in flight still
/// run to completion.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Builds a client that talks to `config.endpoint` over HTTP.
    pub fn connect(options: Options, config: ClientConfig) -> Result<Self, ClientError> {
        check(&options)?;
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or(ClientError::MissingEndpoint)?;
        let transport = HttpInventory::new(endpoint, config.api_version.clone(), &options)?;
        Self::with_config(options, config, Arc::new(transport))
    }

    pub fn with_transport(
        options: Options,
        transport: Arc<dyn InstanceInventory>,
    ) -> Result<Self, ClientError> {
        Self::with_config(options, ClientConfig::default(), transport)
    }

    /// Validates an untyped option record, then builds the client.
    pub fn from_value(
        options: &Value,
        transport: Arc<dyn InstanceInventory>,
    ) -> Result<Self, ClientError> {
        let options = settings::validate(options)?;
        Self::with_transport(options, transport)
    }

    /// Builds the client and queues its first activity on the current
    /// runtime: polling when `options.interval` is set, a single query
    /// otherwise.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_config(
        options: Options,
        config: ClientConfig,
        transport: Arc<dyn InstanceInventory>,
    ) -> Result<Self, ClientError> {
        check(&options)?;
        settings::check_interval(config.default_interval)?;
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;

        let Options {
            tags,
            region,
            interval,
            ..
        } = options;
        let polling = interval.is_some();

        let inner = Arc::new(ClientInner {
            transport,
            tags,
            runtime,
            region,
            interval: Mutex::new(interval.unwrap_or(config.default_interval)),
            next_request_id: AtomicU64::new(0),
            scheduler: PollScheduler::new(),
            pending: PendingTracker::new(),
            bus: EventBus::new(),
            emitting: ReentrantMutex::new(()),
        });

        tracing::debug!(
            transport = inner.transport.name(),
            tags = inner.tags.len(),
            polling,
            "Client created"
        );

        let weak = Arc::downgrade(&inner);
        inner.runtime.spawn(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if polling {
                inner.start();
            } else {
                query::run_once(&inner);
            }
        });

        Ok(Self { inner })
    }

    /// Restarts polling: cancels any running timer, queries immediately and
    /// then once per interval.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Stops the timer. Does nothing, and emits nothing, when idle.
    pub fn stop(&self) {
        self.inner.scheduler.stop(&self.inner);
    }

    /// Runs one query cycle outside the timer.
    pub fn run_once(&self) -> RequestId {
        query::run_once(&self.inner)
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval()
    }

    /// Sets the polling interval in milliseconds and restarts polling.
    ///
    /// A non-positive value, or one above
    /// [`MAX_INTERVAL`](settings::MAX_INTERVAL), is rejected: an
    /// `error` event is emitted, the previous interval is kept and the timer
    /// is left alone. An accepted
    /// value always restarts the cadence with an immediate query, even when
    /// it equals the current interval or the client was idle.
    pub fn set_interval(&self, millis: f64) -> Result<(), ValidationError> {
        let interval = match settings::interval_from_millis(millis) {
            Ok(interval) => interval,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected interval update");
                self.inner.emit(Event::Error(ErrorEvent {
                    request_id: None,
                    timestamp: Utc::now(),
                    status_code: None,
                    message: err.to_string(),
                    cause: Arc::new(err.clone()),
                }));
                return Err(err);
            }
        };

        *self.inner.interval.lock() = interval;
        self.inner.start();
        Ok(())
    }

    /// Number of requests that have started and not yet ended.
    pub fn pending(&self) -> usize {
        self.inner.pending.count()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.scheduler.is_polling()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.inner.tags
    }

    pub fn region(&self) -> Option<&str> {
        self.inner.region.as_deref()
    }

    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&Event) + Send + Sync + 'static,
    ) -> ListenerId {
        self.inner.bus.on(kind, listener)
    }

    pub fn on_any(&self, listener: impl Fn(&Event) + Send + Sync + 'static) -> ListenerId {
        self.inner.bus.on_any(listener)
    }

    pub fn off(&self, id: ListenerId) {
        self.inner.bus.off(id);
    }

    /// Streams every event emitted from now on.
    ///
    /// The listener feeding the stream removes itself on the first event
    /// emitted after the receiver is dropped.
    pub fn events(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        let own_id: Arc<OnceLock<ListenerId>> = Arc::new(OnceLock::new());

        let weak = Arc::downgrade(&self.inner);
        let slot = Arc::clone(&own_id);
        let id = self.inner.bus.on_any(move |event| {
            if tx.send(event.clone()).is_ok() {
                return;
            }
            if let (Some(inner), Some(id)) = (weak.upgrade(), slot.get()) {
                inner.bus.off(*id);
            }
        });
        let _ = own_id.set(id);
        rx
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.inner.transport.name())
            .field("region", &self.inner.region)
            .field("tags", &self.inner.tags)
            .field("interval", &self.interval())
            .field("polling", &self.is_polling())
            .field("pending", &self.pending())
            .finish()
    }
}

fn check(options: &Options) -> Result<(), ValidationError> {
    options.interval.map_or(Ok(()), settings::check_interval)
}
