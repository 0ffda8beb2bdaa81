use crate::record::LogRecord;
use crate::stats::Counters;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// What happened to a record handed to [`DeliveryQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Stored without evicting anything.
    Accepted,
    /// Stored after evicting the oldest record.
    DroppedOldest,
    /// Rejected: the queue is closed for shutdown.
    Closed,
}

#[derive(Debug, Default)]
struct QueueInner {
    records: VecDeque<LogRecord>,
    closed: bool,
}

/// Bounded FIFO between the facade and the transmitter.
///
/// Pushing never blocks: once `capacity` is reached the oldest record is
/// evicted and counted. The transmitter is woken as soon as a full batch
/// is waiting.
#[derive(Debug)]
pub struct DeliveryQueue {
    inner: Mutex<QueueInner>,
    capacity: usize,
    batch_size: usize,
    ready: Notify,
    counters: Arc<Counters>,
}

impl DeliveryQueue {
    pub fn new(capacity: usize, batch_size: usize, counters: Arc<Counters>) -> Self {
        let capacity = capacity.max(1);
        DeliveryQueue {
            inner: Mutex::new(QueueInner {
                records: VecDeque::with_capacity(capacity.min(4096)),
                closed: false,
            }),
            capacity,
            batch_size: batch_size.clamp(1, capacity),
            ready: Notify::new(),
            counters,
        }
    }

    pub fn push(&self, record: LogRecord) -> PushOutcome {
        let (outcome, batch_ready) = {
            let mut inner = self.inner.lock();
            if inner.closed {
                Counters::add(&self.counters.dropped_closed, 1);
                return PushOutcome::Closed;
            }

            let outcome = if inner.records.len() >= self.capacity {
                inner.records.pop_front();
                Counters::add(&self.counters.dropped_queue_full, 1);
                PushOutcome::DroppedOldest
            } else {
                PushOutcome::Accepted
            };
            inner.records.push_back(record);
            Counters::add(&self.counters.enqueued, 1);
            (outcome, inner.records.len() >= self.batch_size)
        };

        if batch_ready {
            self.ready.notify_one();
        }
        outcome
    }

    /// Remove up to `max` records from the front, oldest first.
    pub fn drain(&self, max: usize) -> Vec<LogRecord> {
        let mut inner = self.inner.lock();
        let n = max.min(inner.records.len());
        inner.records.drain(..n).collect()
    }

    /// Stop accepting records. Already queued records stay drainable.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.ready.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolves once a full batch is waiting or the queue is closed.
    ///
    /// A wake-up that happened while nobody was waiting is kept, so the
    /// next call returns immediately.
    pub async fn batch_ready(&self) {
        self.ready.notified().await;
    }
}
