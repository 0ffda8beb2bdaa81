//! The public logging facade.
//!
//! [`Loggly`] is a cheaply clonable handle to one client: its customer
//! token, the global fields and tags, the delivery queue and the worker
//! that empties it. Tests create a fresh handle each; applications
//! usually create one at startup and can park it in the process-wide
//! slot from [`crate::init`].

use crate::config::LogglyConfig;
use crate::error::{ConfigError, LogError};
use crate::format::{format_message, FormatArg};
use crate::queue::{DeliveryQueue, PushOutcome};
use crate::record::{Level, LogRecord};
use crate::sink::LogSink;
use crate::state::{Fields, Tags, Token};
use crate::stats::{Counters, StatsSnapshot};
use crate::transmitter::{Transmitter, TransmitterHandle, WorkerState};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Clone)]
pub struct Loggly {
    inner: Arc<Inner>,
}

struct Inner {
    config: LogglyConfig,
    token: Token,
    fields: Fields,
    tags: Tags,
    queue: Arc<DeliveryQueue>,
    counters: Arc<Counters>,
    transmitter: TransmitterHandle,
}

impl Loggly {
    /// Client that delivers to the Loggly bulk endpoint over HTTPS.
    ///
    /// Spawns the delivery worker, so it must be called from within a
    /// Tokio runtime.
    ///
    /// **Errors**
    /// - [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    #[cfg(feature = "http")]
    pub fn new(config: LogglyConfig) -> Result<Self, ConfigError> {
        let sink = crate::loggly::LogglySink::new(&config.normalized())?;
        Ok(Self::with_sink(config, Arc::new(sink)))
    }

    /// Client configured from the `LOGGLY_*` environment variables, and
    /// initialized right away when `LOGGLY_TOKEN` is set.
    #[cfg(feature = "http")]
    pub fn from_env() -> Result<Self, ConfigError> {
        let client = Self::new(LogglyConfig::from_env()?)?;
        if let Some(token) = crate::env::token_from_env() {
            client.initialize(token)?;
        }
        Ok(client)
    }

    /// Client delivering to an arbitrary [`LogSink`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_sink(config: LogglyConfig, sink: Arc<dyn LogSink>) -> Self {
        let config = config.normalized();
        let counters = Arc::new(Counters::default());
        let queue = Arc::new(DeliveryQueue::new(
            config.queue_capacity,
            config.batch_size,
            Arc::clone(&counters),
        ));
        let token = Token::default();
        let tags = Tags::default();
        for tag in &config.tags {
            tags.add(tag.clone());
        }

        let transmitter = Transmitter::spawn(
            Arc::clone(&queue),
            sink,
            token.clone(),
            Arc::clone(&counters),
            config.clone(),
        );

        Loggly {
            inner: Arc::new(Inner {
                config,
                token,
                fields: Fields::default(),
                tags,
                queue,
                counters,
                transmitter,
            }),
        }
    }

    /// Set the customer token. Calling it again replaces the token and
    /// leaves fields and tags untouched.
    ///
    /// **Errors**
    /// - [`ConfigError::EmptyToken`] for an empty or blank token; the
    ///   previous token, if any, stays in effect.
    pub fn initialize(&self, token: impl Into<String>) -> Result<(), ConfigError> {
        let replacing = self.inner.token.is_set();
        self.inner.token.set(token)?;
        debug!(replacing, "loggly client initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.token.is_set()
    }

    /// Log at [`Level::Info`].
    ///
    /// `message` is a printf-style template rendered against `args`.
    /// The call only renders the message and pushes the record onto the
    /// queue; delivery happens on the background worker.
    ///
    /// **Errors**
    /// - [`ConfigError::NotInitialized`] before [`initialize`](Self::initialize),
    ///   on every call, with nothing enqueued.
    /// - [`crate::error::FormatError`] when `message` and `args` disagree.
    pub fn log(&self, message: &str, args: &[FormatArg]) -> Result<(), LogError> {
        self.log_at(Level::Info, message, args)
    }

    /// Log with a raw numeric level (`0` DEBUG, `1` INFO, `2` WARNING,
    /// `3` ERROR).
    ///
    /// Out-of-range levels are not an error: they are clamped to the
    /// nearest valid level, counted, and reported through `tracing`.
    pub fn log_with_level(&self, level: i64, message: &str, args: &[FormatArg]) -> Result<(), LogError> {
        let level = match Level::from_raw(level) {
            Ok(level) => level,
            Err(nearest) => {
                Counters::add(&self.inner.counters.levels_clamped, 1);
                warn!(requested = level, clamped_to = %nearest, "log level out of range, clamping");
                nearest
            }
        };
        self.log_at(level, message, args)
    }

    /// Log with an explicit [`Level`].
    pub fn log_at(&self, level: Level, message: &str, args: &[FormatArg]) -> Result<(), LogError> {
        self.ensure_initialized()?;
        let message = format_message(message, args)?;
        self.enqueue(level, message, BTreeMap::new());
        Ok(())
    }

    /// Enqueue an already rendered message with extra per-record fields
    /// layered over the global ones.
    pub fn log_structured(
        &self,
        level: Level,
        message: impl Into<String>,
        extra_fields: BTreeMap<String, Value>,
    ) -> Result<(), ConfigError> {
        self.ensure_initialized()?;
        self.enqueue(level, message.into(), extra_fields);
        Ok(())
    }

    /// Live fields attached to every record created from now on.
    pub fn fields(&self) -> &Fields {
        &self.inner.fields
    }

    /// Live tags attached to every record created from now on.
    pub fn tags(&self) -> &Tags {
        &self.inner.tags
    }

    pub fn config(&self) -> &LogglyConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.counters.snapshot()
    }

    pub fn worker_state(&self) -> WorkerState {
        self.inner.transmitter.state()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Deliver everything queued so far and wait for that pass to end.
    pub async fn flush(&self) {
        self.inner.transmitter.flush().await;
    }

    /// Stop accepting records, run the bounded final flush and stop the
    /// worker. Records logged afterwards are counted as dropped.
    pub async fn shutdown(&self) -> StatsSnapshot {
        self.inner.queue.close();
        self.inner.transmitter.shutdown().await;
        self.stats()
    }

    fn ensure_initialized(&self) -> Result<(), ConfigError> {
        if self.inner.token.is_set() {
            Ok(())
        } else {
            Err(ConfigError::NotInitialized)
        }
    }

    fn enqueue(&self, level: Level, message: String, extra_fields: BTreeMap<String, Value>) {
        // Snapshots are taken, and their locks released, before the queue
        // lock is touched.
        let mut fields = self.inner.fields.snapshot();
        fields.extend(extra_fields);
        let tags = self.inner.tags.snapshot();

        let record = LogRecord::new(level, message)
            .with_fields(fields)
            .with_tags(tags);

        match self.inner.queue.push(record) {
            PushOutcome::Accepted => {}
            PushOutcome::DroppedOldest => trace!("log queue full, dropped oldest record"),
            PushOutcome::Closed => trace!("log queue closed, record dropped"),
        }
    }
}

impl std::fmt::Debug for Loggly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loggly")
            .field("initialized", &self.is_initialized())
            .field("queue_len", &self.queue_len())
            .field("worker_state", &self.worker_state())
            .finish()
    }
}
