use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a bulk processor. Shared with its background flusher.
#[derive(Debug, Default)]
pub struct BulkMetrics {
    queued: AtomicU64,
    requests: AtomicU64,
    bytes_sent: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkStats {
    /// Operations accepted by `add`.
    pub queued: u64,
    /// Bulk requests sent.
    pub requests: u64,
    pub bytes_sent: u64,
    /// Operations the store acknowledged.
    pub succeeded: u64,
    /// Operations the store rejected individually.
    pub failed: u64,
}

impl BulkMetrics {
    pub fn increment_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self, bytes: usize, succeeded: u64, failed: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.succeeded.fetch_add(succeeded, Ordering::Relaxed);
        self.failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BulkStats {
        BulkStats {
            queued: self.queued.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
