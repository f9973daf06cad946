//! Batched diagnostic reporting
//!
//! `Diagnostic` queues small summaries ("N events failed with code C because
//! of R") and ships them to the diagnostic collector in one request.
//!
//! The first event tracked into an empty queue arms a one-shot flush timer;
//! later events ride along with it. Flushing, manual or timed, cancels the
//! pending timer, drains the whole queue and hands the batch to the
//! transport once. Delivery is best effort: failures are logged and the
//! batch is discarded.

mod models;
pub use models::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::{DiagnosticConfig, DEFAULT_PROVIDER};
use crate::core::DestinationPlugin;
use crate::error::Result;
use crate::transport::{HttpTransport, Transport};

/// Diagnostic event batcher
///
/// Cloning is cheap; clones share the same queue and timer.
#[derive(Clone)]
pub struct Diagnostic {
    shared: Arc<Shared>,
}

struct Shared {
    server_url: String,
    library: String,
    delay: Duration,
    is_disabled: bool,
    transport: Option<Arc<dyn Transport>>,
    state: Mutex<BatchState>,
    counters: Counters,
}

#[derive(Default)]
struct BatchState {
    queue: Vec<DiagnosticEvent>,
    scheduled: Option<FlushTimer>,
    next_timer_id: u64,
}

/// The single pending flush. A firing timer only drains if it is still the
/// one stored here.
struct FlushTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Counters {
    events_tracked: AtomicU64,
    timers_armed: AtomicU64,
    timers_cancelled: AtomicU64,
    batches_sent: AtomicU64,
    batches_failed: AtomicU64,
    events_dropped: AtomicU64,
}

/// Point-in-time copy of the batcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticStats {
    pub events_tracked: u64,
    pub timers_armed: u64,
    pub timers_cancelled: u64,
    pub batches_sent: u64,
    pub batches_failed: u64,
    /// Events lost to failed deliveries or a missing transport
    pub events_dropped: u64,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_timer(self: &Arc<Self>, state: &mut BatchState) {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime available, diagnostic flush not scheduled");
                return;
            }
        };

        let id = state.next_timer_id;
        state.next_timer_id = state.next_timer_id.wrapping_add(1);

        let shared = Arc::clone(self);
        let delay = self.delay;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire_timer(id).await;
        });

        state.scheduled = Some(FlushTimer { id, handle });
        self.counters.timers_armed.fetch_add(1, Ordering::Relaxed);
        debug!("Diagnostic flush scheduled in {:?}", delay);
    }

    async fn fire_timer(&self, id: u64) {
        let batch = {
            let mut state = self.lock_state();
            match &state.scheduled {
                Some(timer) if timer.id == id => {}
                // superseded by a manual flush
                _ => return,
            }
            state.scheduled = None;
            std::mem::take(&mut state.queue)
        };

        self.deliver(batch).await;
    }

    /// Cancel the pending timer and take the whole queue
    fn take_batch(&self) -> Vec<DiagnosticEvent> {
        let mut state = self.lock_state();
        if let Some(timer) = state.scheduled.take() {
            timer.handle.abort();
            self.counters.timers_cancelled.fetch_add(1, Ordering::Relaxed);
        }
        std::mem::take(&mut state.queue)
    }

    async fn deliver(&self, batch: Vec<DiagnosticEvent>) {
        if batch.is_empty() {
            return;
        }

        let count = batch.len() as u64;
        let Some(transport) = self.transport.as_ref() else {
            debug!("No diagnostic transport configured, dropping {} events", count);
            self.counters.events_dropped.fetch_add(count, Ordering::Relaxed);
            return;
        };

        let payload = RequestPayload::new(batch);
        match transport.send(&self.server_url, &payload).await {
            Ok(()) => {
                self.counters.batches_sent.fetch_add(1, Ordering::Relaxed);
                debug!("Delivered {} diagnostic events to {}", count, self.server_url);
            }
            Err(e) => {
                self.counters.batches_failed.fetch_add(1, Ordering::Relaxed);
                self.counters.events_dropped.fetch_add(count, Ordering::Relaxed);
                warn!("Failed to deliver {} diagnostic events to {}: {}", count, self.server_url, e);
            }
        }
    }
}

impl Default for Diagnostic {
    fn default() -> Self {
        let config = DiagnosticBuilder::new().resolve_config().unwrap_or_else(|e| {
            warn!("Invalid diagnostic configuration, using defaults: {}", e);
            DiagnosticConfig::default()
        });
        let transport = HttpTransport::with_options(None, Some(config.timeout()));
        Self::with_fallback_transport(config, transport)
    }
}

impl Diagnostic {
    /// Create a batcher for the default diagnostic endpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batcher for a custom endpoint
    pub fn with_server_url(server_url: impl Into<String>) -> Result<Self> {
        DiagnosticBuilder::new().server_url(server_url).build()
    }

    pub fn builder() -> DiagnosticBuilder {
        DiagnosticBuilder::new()
    }

    /// Keep the configuration even when the HTTP transport could not be built
    pub(crate) fn with_fallback_transport(config: DiagnosticConfig, transport: Result<HttpTransport>) -> Self {
        match transport {
            Ok(transport) => Self::from_parts(config, Some(Arc::new(transport))),
            Err(e) => {
                warn!("Failed to build diagnostic transport, events will not be delivered: {}", e);
                Self::from_parts(config, None)
            }
        }
    }

    fn from_parts(config: DiagnosticConfig, transport: Option<Arc<dyn Transport>>) -> Self {
        let delay = config.flush_delay();
        Self {
            shared: Arc::new(Shared {
                server_url: config.server_url,
                library: config.library,
                delay,
                is_disabled: config.is_disabled,
                transport,
                state: Mutex::new(BatchState::default()),
                counters: Counters::default(),
            }),
        }
    }

    /// Queue one diagnostic event
    ///
    /// Arms the flush timer when none is pending. Never fails; a disabled
    /// batcher ignores the call.
    pub fn track(
        &self,
        event_count: u64,
        response_error_code: i32,
        trigger: impl Into<String>,
        action: Option<&str>,
    ) {
        if self.shared.is_disabled {
            return;
        }

        let event = DiagnosticEvent {
            time: Utc::now().timestamp_millis(),
            event_properties: EventProperties {
                response_error_code,
                trigger: trigger.into(),
                action: action.map(str::to_string),
                event_count,
            },
            library: self.shared.library.clone(),
        };

        let mut state = self.shared.lock_state();
        state.queue.push(event);
        self.shared.counters.events_tracked.fetch_add(1, Ordering::Relaxed);

        if state.scheduled.is_none() {
            self.shared.arm_timer(&mut state);
        }
    }

    /// Cancel any pending timer, drain the queue and try to deliver it
    ///
    /// Resolves once the delivery attempt finishes. Transport errors are
    /// logged, never returned.
    #[tracing::instrument(skip(self), fields(server_url = %self.shared.server_url))]
    pub async fn flush(&self) {
        let batch = self.shared.take_batch();
        self.shared.deliver(batch).await;
    }

    /// Build the collector request for a batch
    pub fn request_payload_builder(&self, events: Vec<DiagnosticEvent>) -> RequestPayload {
        RequestPayload::new(events)
    }

    pub fn server_url(&self) -> &str {
        &self.shared.server_url
    }

    pub fn library(&self) -> &str {
        &self.shared.library
    }

    pub fn flush_delay(&self) -> Duration {
        self.shared.delay
    }

    pub fn is_disabled(&self) -> bool {
        self.shared.is_disabled
    }

    /// Snapshot of the queued events, oldest first
    pub fn queue(&self) -> Vec<DiagnosticEvent> {
        self.shared.lock_state().queue.clone()
    }

    pub fn queue_len(&self) -> usize {
        self.shared.lock_state().queue.len()
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.shared.lock_state().scheduled.is_some()
    }

    pub fn stats(&self) -> DiagnosticStats {
        let counters = &self.shared.counters;
        DiagnosticStats {
            events_tracked: counters.events_tracked.load(Ordering::Relaxed),
            timers_armed: counters.timers_armed.load(Ordering::Relaxed),
            timers_cancelled: counters.timers_cancelled.load(Ordering::Relaxed),
            batches_sent: counters.batches_sent.load(Ordering::Relaxed),
            batches_failed: counters.batches_failed.load(Ordering::Relaxed),
            events_dropped: counters.events_dropped.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl DestinationPlugin for Diagnostic {
    fn name(&self) -> &str {
        "diagnostic"
    }
}

/// Builder for the diagnostic batcher
#[derive(Default)]
pub struct DiagnosticBuilder {
    config: Option<DiagnosticConfig>,
    server_url: Option<String>,
    library: Option<String>,
    flush_delay: Option<Duration>,
    disabled: Option<bool>,
    timeout_seconds: Option<u64>,
    transport: Option<Arc<dyn Transport>>,
    without_transport: bool,
}

impl DiagnosticBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit configuration instead of the environment
    pub fn config(mut self, config: DiagnosticConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = Some(delay);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Set the HTTP transport timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Queue and drain without ever sending anything
    pub fn without_transport(mut self) -> Self {
        self.without_transport = true;
        self
    }

    /// Base config (explicit or environment) with the builder overrides applied
    fn resolve_config(&self) -> Result<DiagnosticConfig> {
        let mut config = match &self.config {
            Some(config) => config.clone(),
            None => DiagnosticConfig::from_provider(&**DEFAULT_PROVIDER).unwrap_or_else(|e| {
                warn!("Failed to load diagnostic config from environment, using defaults: {}", e);
                DiagnosticConfig::default()
            }),
        };

        if let Some(server_url) = &self.server_url {
            config.server_url = server_url.clone();
        }

        if let Some(library) = &self.library {
            config.library = library.clone();
        }

        if let Some(delay) = self.flush_delay {
            // saturate rather than wrap for absurdly long delays
            config.flush_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        }

        if let Some(disabled) = self.disabled {
            config.is_disabled = disabled;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn build(self) -> Result<Diagnostic> {
        let config = self.resolve_config()?;

        let transport: Option<Arc<dyn Transport>> = if self.without_transport {
            None
        } else {
            match self.transport {
                Some(transport) => Some(transport),
                None => Some(Arc::new(HttpTransport::with_options(None, Some(config.timeout()))?)),
            }
        };

        Ok(Diagnostic::from_parts(config, transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(60_000);

    fn create_detached_diagnostic() -> Diagnostic {
        Diagnostic::builder()
            .config(DiagnosticConfig::default())
            .without_transport()
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_drain_next_batch() {
        let diagnostic = create_detached_diagnostic();
        let shared = Arc::clone(&diagnostic.shared);

        diagnostic.track(1, 500, "a", None);
        let stale_id = shared.lock_state().scheduled.as_ref().map(|timer| timer.id).unwrap();

        diagnostic.flush().await;
        diagnostic.track(1, 500, "b", None);
        assert_eq!(shared.counters.events_dropped.load(Ordering::Relaxed), 1);

        // A timer that lost the race with the manual flush wakes up late
        shared.fire_timer(stale_id).await;

        assert_eq!(diagnostic.queue_len(), 1);
        assert!(diagnostic.is_flush_scheduled());
        assert_eq!(diagnostic.stats().events_dropped, 1);

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(diagnostic.queue_len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(diagnostic.queue_len(), 0);
        assert!(!diagnostic.is_flush_scheduled());
        assert_eq!(diagnostic.stats().events_dropped, 2);
    }

    #[test]
    fn test_builder_saturates_huge_flush_delay() {
        let diagnostic = Diagnostic::builder()
            .config(DiagnosticConfig::default())
            .flush_delay(Duration::from_secs(u64::MAX))
            .without_transport()
            .build()
            .unwrap();

        assert_eq!(diagnostic.flush_delay(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_fallback_keeps_config_without_transport() {
        let config = DiagnosticConfig {
            server_url: "https://configured.example.com/diag".to_string(),
            library: "configured-library".to_string(),
            ..DiagnosticConfig::default()
        };

        let diagnostic = Diagnostic::with_fallback_transport(
            config,
            Err(crate::error::DiagnosticError::internal("client build failed")),
        );

        assert_eq!(diagnostic.server_url(), "https://configured.example.com/diag");
        assert_eq!(diagnostic.library(), "configured-library");
        assert!(diagnostic.shared.transport.is_none());
    }

    #[tokio::test]
    async fn test_fallback_without_transport_drops_events() {
        let diagnostic = Diagnostic::with_fallback_transport(
            DiagnosticConfig::default(),
            Err(crate::error::DiagnosticError::internal("client build failed")),
        );

        diagnostic.track(2, 500, "server error", None);
        diagnostic.flush().await;

        assert_eq!(diagnostic.queue_len(), 0);
        assert_eq!(diagnostic.stats().events_dropped, 1);
    }

    #[test]
    fn test_fallback_with_transport_keeps_it() {
        let transport = HttpTransport::with_options(None, Some(Duration::from_secs(5)));
        let diagnostic = Diagnostic::with_fallback_transport(DiagnosticConfig::default(), transport);

        assert!(diagnostic.shared.transport.is_some());
    }
}
