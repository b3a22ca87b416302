use crate::bulk::encode_bulk;
use crate::config::ElasticConfig;
use crate::error::{BuildError, TransportError};
use crate::normalize::{is_ignored_target, normalize};
use crate::record::{Document, LogEvent};
use crate::transport::BulkTransport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{sleep, timeout, Duration};

/// Outcome of [`ElasticHandler::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    /// Normalized and appended to the batch.
    Accepted,
    /// Emitted by an ignored target (the transport's own logging).
    Filtered,
    /// Batch was full.
    Dropped,
}

/// Point-in-time copy of the handler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Events passed to `submit`.
    pub submitted: u64,
    /// Events discarded as self-noise.
    pub filtered: u64,
    /// Events discarded because the batch was full.
    pub dropped: u64,
    /// Bulk requests attempted.
    pub flushes: u64,
    /// Bulk requests that failed; their documents are gone.
    pub failed_flushes: u64,
    /// Documents in successful bulk requests.
    pub shipped: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    filtered: AtomicU64,
    dropped: AtomicU64,
    flushes: AtomicU64,
    failed_flushes: AtomicU64,
    shipped: AtomicU64,
}

/// The armed one-shot flush. `generation` identifies it so that a timer
/// superseded by an explicit flush exits without flushing.
struct FlushTimer {
    generation: u64,
    abort: AbortHandle,
}

#[derive(Default)]
struct State {
    batch: Vec<Document>,
    timer: Option<FlushTimer>,
    generation: u64,
}

struct Inner {
    state: Mutex<State>,
    transport: Arc<dyn BulkTransport>,
    runtime: Handle,
    capacity: usize,
    flush_delay: Duration,
    request_timeout: Duration,
    ignored_targets: Vec<String>,
    counters: Counters,
}

/// Bounded in-memory batch of [`Document`]s with a coalescing flush timer.
///
/// `submit` never waits on I/O: it appends under a mutex and, if no flush
/// is pending, spawns a one-shot timer on the captured tokio runtime. When
/// the timer fires the whole batch is drained, encoded and handed to the
/// [`BulkTransport`]. Delivery is at most once: a failed request loses its
/// batch, and events arriving while the batch is full are dropped.
///
/// Cloning is cheap and yields a handle to the same batch.
#[derive(Clone)]
pub struct ElasticHandler {
    inner: Arc<Inner>,
}

impl ElasticHandler {
    /// Create a handler that flushes through `transport`, running its
    /// timer on the current tokio runtime.
    ///
    /// **Returns**
    /// - `Err(BuildError::NoRuntime)` when called outside a runtime; use
    ///   [`ElasticHandler::with_runtime`] from plain threads.
    pub fn new(config: &ElasticConfig, transport: Arc<dyn BulkTransport>) -> Result<Self, BuildError> {
        let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;
        Ok(Self::with_runtime(config, transport, runtime))
    }

    /// Create a handler whose flush timers run on `runtime`.
    ///
    /// Minimal thresholds are enforced for `capacity` and `flush_delay` to
    /// avoid degenerate configurations.
    pub fn with_runtime(config: &ElasticConfig, transport: Arc<dyn BulkTransport>, runtime: Handle) -> Self {
        let capacity = config.capacity.max(1);
        let flush_delay = config.flush_delay.max(Duration::from_millis(10));

        ElasticHandler {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                transport,
                runtime,
                capacity,
                flush_delay,
                request_timeout: config.request_timeout,
                ignored_targets: config.ignored_targets.clone(),
                counters: Counters::default(),
            }),
        }
    }

    /// Create a handler posting to the `_bulk` endpoint described by `config`.
    #[cfg(feature = "elastic")]
    pub fn connect(config: &ElasticConfig) -> Result<Self, BuildError> {
        let transport = crate::elastic::ElasticTransport::new(config)?;
        Self::new(config, Arc::new(transport))
    }

    /// Buffer one event.
    ///
    /// Events from ignored targets and events arriving while the batch is
    /// full are discarded without being normalized.
    pub fn submit(&self, event: &LogEvent) -> Submit {
        let counters = &self.inner.counters;
        counters.submitted.fetch_add(1, Ordering::Relaxed);

        if is_ignored_target(&event.name, &self.inner.ignored_targets) {
            counters.filtered.fetch_add(1, Ordering::Relaxed);
            return Submit::Filtered;
        }

        let mut state = self.lock();
        if state.batch.len() >= self.inner.capacity {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            return Submit::Dropped;
        }

        state.batch.push(normalize(event));
        if state.timer.is_none() {
            self.arm_timer(&mut state);
        }
        Submit::Accepted
    }

    /// Ship whatever is buffered now and cancel the pending timer.
    ///
    /// Transport failures are discarded here; the batch is gone either way.
    pub async fn flush(&self) {
        let _ = self.try_flush().await;
    }

    /// Final flush for shutdown. Waits for the bulk request to complete
    /// (bounded by the request timeout).
    pub async fn close(&self) {
        self.flush().await;
    }

    /// Like [`flush`](Self::flush) but reports the transport outcome:
    /// the number of documents shipped, or the error that lost them.
    pub async fn try_flush(&self) -> Result<usize, TransportError> {
        let docs = {
            let mut state = self.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort.abort();
            }
            std::mem::take(&mut state.batch)
        };
        self.ship(docs).await
    }

    /// Number of buffered documents.
    pub fn len(&self) -> usize {
        self.lock().batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a flush timer is pending.
    pub fn timer_armed(&self) -> bool {
        self.lock().timer.is_some()
    }

    pub fn stats(&self) -> SinkStats {
        let c = &self.inner.counters;
        SinkStats {
            submitted: c.submitted.load(Ordering::Relaxed),
            filtered: c.filtered.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            flushes: c.flushes.load(Ordering::Relaxed),
            failed_flushes: c.failed_flushes.load(Ordering::Relaxed),
            shipped: c.shipped.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_timer(&self, state: &mut State) {
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let delay = self.inner.flush_delay;
        let handler = self.clone();

        let task = self.inner.runtime.spawn(async move {
            sleep(delay).await;
            handler.fire(generation).await;
        });

        state.timer = Some(FlushTimer {
            generation,
            abort: task.abort_handle(),
        });
    }

    async fn fire(&self, generation: u64) {
        let docs = {
            let mut state = self.lock();
            // Canceled by an explicit flush.
            if state.timer.as_ref().map(|t| t.generation) != Some(generation) {
                return;
            }
            state.timer = None;
            std::mem::take(&mut state.batch)
        };
        let _ = self.ship(docs).await;
    }

    async fn ship(&self, docs: Vec<Document>) -> Result<usize, TransportError> {
        if docs.is_empty() {
            return Ok(0);
        }

        let counters = &self.inner.counters;
        counters.flushes.fetch_add(1, Ordering::Relaxed);

        let count = docs.len();
        let body = encode_bulk(&docs);
        drop(docs);

        let limit = self.inner.request_timeout;
        let result = match timeout(limit, self.inner.transport.post_bulk(body)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit)),
        };

        match result {
            Ok(()) => {
                counters.shipped.fetch_add(count as u64, Ordering::Relaxed);
                Ok(count)
            }
            Err(e) => {
                counters.failed_flushes.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}
