//! Batching of bulk operations with count, size and interval flush triggers.

use crate::{
    connectors::sink::BulkSink,
    error::SinkError,
    metrics::{BulkMetrics, BulkStats},
};
use async_trait::async_trait;
use connectors::elastic::requests::encode_operation;
use model::records::batch::BulkOperation;
use std::{
    sync::{Arc, PoisonError},
    time::Duration,
};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one bulk request, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: u64,
    pub failed: u64,
}

/// Ships an encoded NDJSON bulk body to a store.
///
/// An `Err` means the request as a whole failed. Operations the store
/// rejected one by one are reported through `BulkOutcome::failed`.
#[async_trait]
pub trait BulkTransport: Send + Sync + 'static {
    async fn send(&self, body: Vec<u8>, actions: usize) -> Result<BulkOutcome, SinkError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkConfig {
    /// Flush once this many operations are pending. Zero disables the trigger.
    pub max_actions: usize,
    /// Flush once the encoded body reaches this many bytes. Zero disables the trigger.
    pub max_bytes: usize,
    /// Flush pending operations periodically.
    pub flush_interval: Option<Duration>,
}

impl BulkConfig {
    pub fn new(max_actions: usize, max_bytes: usize, flush_interval: Option<Duration>) -> Self {
        Self {
            max_actions,
            max_bytes,
            flush_interval: flush_interval.filter(|d| !d.is_zero()),
        }
    }

    fn should_commit(&self, pending: &Pending) -> bool {
        (self.max_actions > 0 && pending.actions >= self.max_actions)
            || (self.max_bytes > 0 && pending.body.len() >= self.max_bytes)
    }
}

#[derive(Default)]
struct Pending {
    body: Vec<u8>,
    actions: usize,
}

struct Shared<T> {
    name: String,
    transport: T,
    pending: Mutex<Pending>,
    metrics: BulkMetrics,
    failure: std::sync::Mutex<Option<SinkError>>,
    cancel: CancellationToken,
}

impl<T: BulkTransport> Shared<T> {
    async fn commit(&self, pending: &mut Pending) -> Result<(), SinkError> {
        if pending.actions == 0 {
            return Ok(());
        }

        let body = std::mem::take(&mut pending.body);
        let actions = std::mem::take(&mut pending.actions);
        let bytes = body.len();

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(processor = %self.name, actions, "Bulk request abandoned");
                return Err(SinkError::Cancelled(self.name.clone()));
            }
            res = self.transport.send(body, actions) => res?,
        };
        self.metrics
            .record_request(bytes, outcome.succeeded, outcome.failed);

        if outcome.failed > 0 {
            warn!(
                processor = %self.name,
                failed = outcome.failed,
                actions,
                "Store rejected bulk operations"
            );
        } else {
            debug!(processor = %self.name, actions, bytes, "Bulk request committed");
        }
        Ok(())
    }

    fn store_failure(&self, err: SinkError) {
        let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(err);
    }

    fn take_failure(&self) -> Option<SinkError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

struct Flusher {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

/// Accumulates bulk operations and commits them through a [`BulkTransport`].
///
/// A commit happens inline when a count or size threshold is reached, and in
/// a background task when the flush interval elapses. A failed background
/// commit is reported by the next `add` or by `close`.
///
/// Cancelling the token handed to [`BulkProcessor::start`] abandons any
/// request in flight and stops the interval flusher. Operations still
/// pending at that point are dropped.
pub struct BulkProcessor<T: BulkTransport> {
    config: BulkConfig,
    shared: Arc<Shared<T>>,
    flusher: Option<Flusher>,
    closed: bool,
}

impl<T: BulkTransport> BulkProcessor<T> {
    /// Must be called from within a tokio runtime when an interval is set.
    pub fn start(
        name: impl Into<String>,
        transport: T,
        config: BulkConfig,
        cancel: CancellationToken,
    ) -> Self {
        let shared = Arc::new(Shared {
            name: name.into(),
            transport,
            pending: Mutex::new(Pending::default()),
            metrics: BulkMetrics::default(),
            failure: std::sync::Mutex::new(None),
            cancel,
        });

        let flusher = config
            .flush_interval
            .map(|every| spawn_flusher(Arc::clone(&shared), every));

        debug!(
            processor = %shared.name,
            max_actions = config.max_actions,
            max_bytes = config.max_bytes,
            flush_interval = ?config.flush_interval,
            "Bulk processor started"
        );

        BulkProcessor {
            config,
            shared,
            flusher,
            closed: false,
        }
    }

    pub fn stats(&self) -> BulkStats {
        self.shared.metrics.snapshot()
    }

    async fn stop_flusher(&mut self) {
        if let Some(flusher) = self.flusher.take() {
            flusher.stop.cancel();
            if let Err(e) = flusher.handle.await {
                warn!(processor = %self.shared.name, error = %e, "Flush task ended abnormally");
            }
        }
    }
}

#[async_trait]
impl<T: BulkTransport> BulkSink for BulkProcessor<T> {
    async fn add(&mut self, op: BulkOperation) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed(self.shared.name.clone()));
        }
        if let Some(err) = self.shared.take_failure() {
            return Err(err);
        }

        let mut encoded = Vec::new();
        encode_operation(&op, &mut encoded)?;

        let mut pending = self.shared.pending.lock().await;
        pending.body.extend_from_slice(&encoded);
        pending.actions += 1;
        self.shared.metrics.increment_queued();

        if self.config.should_commit(&pending) {
            self.shared.commit(&mut pending).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<BulkStats, SinkError> {
        if self.closed {
            return Ok(self.stats());
        }
        self.closed = true;
        self.stop_flusher().await;

        if let Some(err) = self.shared.take_failure() {
            return Err(err);
        }
        {
            let mut pending = self.shared.pending.lock().await;
            self.shared.commit(&mut pending).await?;
        }

        let stats = self.stats();
        info!(
            processor = %self.shared.name,
            requests = stats.requests,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Bulk processor closed"
        );
        Ok(stats)
    }
}

impl<T: BulkTransport> Drop for BulkProcessor<T> {
    fn drop(&mut self) {
        if let Some(flusher) = self.flusher.take() {
            flusher.stop.cancel();
        }
    }
}

fn spawn_flusher<T: BulkTransport>(shared: Arc<Shared<T>>, every: Duration) -> Flusher {
    let stop = shared.cancel.child_token();
    let token = stop.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let mut pending = shared.pending.lock().await;
                    if let Err(e) = shared.commit(&mut pending).await {
                        if e.is_cancellation() {
                            break;
                        }
                        error!(processor = %shared.name, error = %e, "Periodic bulk flush failed");
                        shared.store_failure(e);
                        break;
                    }
                }
            }
        }
    });

    Flusher { stop, handle }
}
