//! Background delivery of queued records.
//!
//! A single Tokio task owns the batching loop. It wakes on the flush
//! interval, when the queue reports a full batch, or on an explicit
//! command, then drains the queue in batches and hands each batch to the
//! [`LogSink`] with bounded retries. Application threads never wait on
//! any of this; the only synchronous step for them is the queue push.

use crate::config::LogglyConfig;
use crate::queue::DeliveryQueue;
use crate::record::LogRecord;
use crate::sink::LogSink;
use crate::state::Token;
use crate::stats::Counters;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

const COMMAND_BUFFER: usize = 8;

tokio::task_local! {
    /// Set for the duration of a sink call.
    static DELIVERING: ();
}

/// Whether the current task is inside a sink call made by the worker.
///
/// The `tracing` bridge uses this to drop events raised by the sink
/// itself, which would otherwise be queued behind the batch that caused
/// them.
pub fn is_delivering() -> bool {
    DELIVERING.try_with(|_| ()).is_ok()
}

/// Extra time the handle gives the worker past the shutdown deadline
/// before aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(50);

/// Phase of the worker loop.
///
/// `Idle → Draining → Sending → (Idle | Retrying → Sending | Exhausted → Idle)`.
/// `Idle` is both the initial and the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Draining = 1,
    Sending = 2,
    Retrying = 3,
    Exhausted = 4,
}

impl WorkerState {
    fn from_u8(v: u8) -> WorkerState {
        match v {
            1 => WorkerState::Draining,
            2 => WorkerState::Sending,
            3 => WorkerState::Retrying,
            4 => WorkerState::Exhausted,
            _ => WorkerState::Idle,
        }
    }
}

#[derive(Debug, Default)]
struct StateCell(AtomicU8);

impl StateCell {
    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }
}

enum Command {
    Flush(oneshot::Sender<()>),
    Shutdown {
        deadline: Instant,
        ack: oneshot::Sender<()>,
    },
}

/// State visible to both the worker and its handle.
#[derive(Debug)]
struct Shared {
    queue: Arc<DeliveryQueue>,
    counters: Arc<Counters>,
    state: StateCell,
    /// Size of the batch currently being sent, 0 when none.
    in_flight: AtomicU64,
}

impl Shared {
    /// Count everything still queued or in flight as lost on shutdown.
    fn drop_leftovers(&self) -> u64 {
        let lost = self.queue.drain(usize::MAX).len() as u64 + self.in_flight.swap(0, Ordering::Relaxed);
        if lost > 0 {
            Counters::add(&self.counters.records_dropped_on_shutdown, lost);
            warn!(records = lost, "shutdown flush timed out, dropping pending log records");
        }
        lost
    }
}

/// Handle held by the facade to control the worker task.
#[derive(Debug)]
pub struct TransmitterHandle {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared>,
    shutdown_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransmitterHandle {
    pub fn state(&self) -> WorkerState {
        self.shared.state.get()
    }

    /// Deliver everything queued at the time of the call. Resolves once
    /// the worker has finished that pass (successfully or not).
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Flush(ack)).await.is_err() {
            return;
        }
        let _ = done.await;
    }

    /// Stop the worker within `shutdown_timeout`.
    ///
    /// The worker closes the queue and flushes until the deadline. If it
    /// is stuck in a send that outlives the deadline, the task is aborted
    /// and whatever it still held is counted as dropped. Calling it again
    /// is a no-op.
    pub async fn shutdown(&self) {
        let task = self.task.lock().take();
        let Some(mut task) = task else {
            return;
        };

        self.shared.queue.close();
        let deadline = Instant::now() + self.shutdown_timeout;
        let (ack, done) = oneshot::channel();
        let sent = timeout_at(deadline, self.commands.send(Command::Shutdown { deadline, ack })).await;
        let finished = matches!(sent, Ok(Ok(()))) && timeout_at(deadline + SHUTDOWN_GRACE, done).await.is_ok();

        if finished {
            if let Err(e) = (&mut task).await {
                error!(error = %e, "log transmitter task ended abnormally");
            }
            return;
        }

        task.abort();
        let _ = task.await;
        self.shared.drop_leftovers();
        self.shared.state.set(WorkerState::Idle);
    }
}

/// The worker itself. Built and spawned through [`Transmitter::spawn`].
pub struct Transmitter {
    shared: Arc<Shared>,
    sink: Arc<dyn LogSink>,
    token: Token,
    config: LogglyConfig,
    commands: mpsc::Receiver<Command>,
}

impl Transmitter {
    /// Spawn the worker on the current Tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn spawn(
        queue: Arc<DeliveryQueue>,
        sink: Arc<dyn LogSink>,
        token: Token,
        counters: Arc<Counters>,
        config: LogglyConfig,
    ) -> TransmitterHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let config = config.normalized();
        let shared = Arc::new(Shared {
            queue,
            counters,
            state: StateCell::default(),
            in_flight: AtomicU64::new(0),
        });

        let worker = Transmitter {
            shared: Arc::clone(&shared),
            sink,
            token,
            config: config.clone(),
            commands: rx,
        };
        let task = tokio::spawn(worker.run());

        TransmitterHandle {
            commands: tx,
            shared,
            shutdown_timeout: config.shutdown_timeout,
            task: Mutex::new(Some(task)),
        }
    }

    async fn run(mut self) {
        let queue = Arc::clone(&self.shared.queue);
        debug!(
            capacity = queue.capacity(),
            batch_size = queue.batch_size(),
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            max_retry_attempts = self.config.max_retry_attempts,
            "log transmitter started"
        );

        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.config.flush_interval,
            self.config.flush_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.deliver_pending().await;
                }
                _ = queue.batch_ready() => {
                    self.deliver_pending().await;
                }
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(Command::Flush(ack)) => {
                            self.deliver_pending().await;
                            let _ = ack.send(());
                        }
                        Some(Command::Shutdown { deadline, ack }) => {
                            self.final_flush(deadline).await;
                            let _ = ack.send(());
                            break;
                        }
                        None => {
                            self.final_flush(Instant::now() + self.config.shutdown_timeout).await;
                            break;
                        }
                    }
                }
            }
        }

        debug!("log transmitter stopped");
    }

    /// Send what is queued right now, in batches. Records that arrive
    /// during the pass wait for the next one, so a busy producer cannot
    /// keep the worker here forever.
    async fn deliver_pending(&self) {
        let queue = &self.shared.queue;
        let mut remaining = queue.len();
        while remaining > 0 {
            self.shared.state.set(WorkerState::Draining);
            let batch = queue.drain(queue.batch_size().min(remaining));
            if batch.is_empty() {
                break;
            }
            remaining -= batch.len();
            self.deliver(batch).await;
        }
        self.shared.state.set(WorkerState::Idle);
    }

    /// Deliver one batch with at most `max_retry_attempts` sends.
    async fn deliver(&self, batch: Vec<LogRecord>) {
        let n = batch.len() as u64;
        let max_attempts = self.config.max_retry_attempts;
        let counters = &self.shared.counters;
        let state = &self.shared.state;

        let Some(token) = self.token.get() else {
            // Unreachable through the facade, which refuses records before
            // a token exists.
            warn!(records = n, "no customer token set, dropping log batch");
            Counters::add(&counters.batches_failed, 1);
            Counters::add(&counters.records_failed, n);
            return;
        };

        self.shared.in_flight.store(n, Ordering::Relaxed);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                state.set(WorkerState::Retrying);
                let delay = self.config.backoff_for(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying log batch");
                sleep(delay).await;
            }

            state.set(WorkerState::Sending);
            Counters::add(&counters.send_attempts, 1);
            match DELIVERING.scope((), self.sink.send_batch(&token, &batch)).await {
                Ok(()) => {
                    Counters::add(&counters.batches_sent, 1);
                    Counters::add(&counters.records_sent, n);
                    self.shared.in_flight.store(0, Ordering::Relaxed);
                    state.set(WorkerState::Idle);
                    return;
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        attempt,
                        max_attempts,
                        records = n,
                        error = %e,
                        "log batch delivery failed"
                    );
                }
            }
        }

        state.set(WorkerState::Exhausted);
        Counters::add(&counters.batches_failed, 1);
        Counters::add(&counters.records_failed, n);
        self.shared.in_flight.store(0, Ordering::Relaxed);
        error!(
            attempts = max_attempts,
            records = n,
            error = %last_error,
            "dropping log batch after exhausting retries"
        );
        state.set(WorkerState::Idle);
    }

    /// Close the queue and drain it until `deadline`. Whatever is still
    /// pending at the deadline is dropped and counted.
    async fn final_flush(&self, deadline: Instant) {
        let queue = &self.shared.queue;
        queue.close();

        let _ = timeout_at(deadline, async {
            while !queue.is_empty() {
                self.deliver_pending().await;
            }
        })
        .await;
        self.shared.drop_leftovers();

        match timeout_at(deadline, DELIVERING.scope((), self.sink.flush())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "log sink flush failed"),
            Err(_) => warn!("log sink flush timed out"),
        }
        self.shared.state.set(WorkerState::Idle);
    }
}
