use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the facade, the queue and the transmitter.
#[derive(Debug, Default)]
pub struct Counters {
    /// Records accepted into the queue.
    pub enqueued: AtomicU64,
    /// Oldest records evicted because the queue was full.
    pub dropped_queue_full: AtomicU64,
    /// Records rejected because the queue was already closed.
    pub dropped_closed: AtomicU64,
    /// Batches the collector accepted.
    pub batches_sent: AtomicU64,
    /// Records inside accepted batches.
    pub records_sent: AtomicU64,
    /// Every call into the sink, successful or not.
    pub send_attempts: AtomicU64,
    /// Batches dropped after exhausting their retries.
    pub batches_failed: AtomicU64,
    /// Records inside failed batches.
    pub records_failed: AtomicU64,
    /// Records still queued when the shutdown flush ran out of time.
    pub records_dropped_on_shutdown: AtomicU64,
    /// `log_with_level` calls whose level had to be clamped.
    pub levels_clamped: AtomicU64,
}

impl Counters {
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            enqueued: get(&self.enqueued),
            dropped_queue_full: get(&self.dropped_queue_full),
            dropped_closed: get(&self.dropped_closed),
            batches_sent: get(&self.batches_sent),
            records_sent: get(&self.records_sent),
            send_attempts: get(&self.send_attempts),
            batches_failed: get(&self.batches_failed),
            records_failed: get(&self.records_failed),
            records_dropped_on_shutdown: get(&self.records_dropped_on_shutdown),
            levels_clamped: get(&self.levels_clamped),
        }
    }
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub dropped_queue_full: u64,
    pub dropped_closed: u64,
    pub batches_sent: u64,
    pub records_sent: u64,
    pub send_attempts: u64,
    pub batches_failed: u64,
    pub records_failed: u64,
    pub records_dropped_on_shutdown: u64,
    pub levels_clamped: u64,
}

impl StatsSnapshot {
    /// Records lost for any reason.
    pub fn total_dropped(&self) -> u64 {
        self.dropped_queue_full
            + self.dropped_closed
            + self.records_failed
            + self.records_dropped_on_shutdown
    }
}
