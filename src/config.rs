use crate::wire::WireFormat;
use std::time::Duration;

/// Default collector base URL.
pub const DEFAULT_ENDPOINT: &str = "https://logs-01.loggly.com";

/// Configuration of the client and its delivery pipeline.
///
/// **Fields**
/// - `endpoint`: collector base URL; batches go to `{endpoint}/bulk/{token}/`.
/// - `queue_capacity`: records held before the oldest start being dropped.
/// - `batch_size`: records per request; a full batch wakes the worker early.
/// - `flush_interval`: longest time a partial batch waits before sending.
/// - `max_retry_attempts`: total send attempts per batch, first try included.
/// - `initial_backoff` / `max_backoff`: delay before the first retry,
///   doubling on each further retry up to the cap.
/// - `shutdown_timeout`: budget of the final flush on shutdown.
/// - `request_timeout`: per-request HTTP timeout.
/// - `wire_format`: body layout of bulk requests.
/// - `tags`: tags present from the start.
#[derive(Clone, Debug, PartialEq)]
pub struct LogglyConfig {
    pub endpoint: String,
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_retry_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub shutdown_timeout: Duration,
    pub request_timeout: Duration,
    pub wire_format: WireFormat,
    pub tags: Vec<String>,
}

impl Default for LogglyConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            queue_capacity: 1000,
            batch_size: 100,
            flush_interval: Duration::from_secs(5),
            max_retry_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            wire_format: WireFormat::JsonArray,
            tags: Vec::new(),
        }
    }
}

impl LogglyConfig {
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_wire_format(mut self, format: WireFormat) -> Self {
        self.wire_format = format;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Copy with minimal thresholds applied so no setting can stall or
    /// spin the worker.
    pub fn normalized(&self) -> Self {
        let mut cfg = self.clone();
        cfg.queue_capacity = cfg.queue_capacity.max(1);
        cfg.batch_size = cfg.batch_size.clamp(1, cfg.queue_capacity);
        cfg.flush_interval = cfg.flush_interval.max(Duration::from_millis(10));
        cfg.max_retry_attempts = cfg.max_retry_attempts.max(1);
        cfg.max_backoff = cfg.max_backoff.max(cfg.initial_backoff);
        cfg.endpoint = cfg.endpoint.trim_end_matches('/').to_string();
        cfg
    }

    /// Delay before retry number `retry` (1-based): `initial * 2^(retry-1)`,
    /// capped at `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LogglyConfig::default();
        assert_eq!(cfg.endpoint, "https://logs-01.loggly.com");
        assert_eq!(cfg.queue_capacity, 1000);
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.flush_interval, Duration::from_secs(5));
        assert_eq!(cfg.max_retry_attempts, 3);
        assert_eq!(cfg.wire_format, WireFormat::JsonArray);
    }

    #[test]
    fn builders() {
        let cfg = LogglyConfig::default()
            .with_endpoint("http://127.0.0.1:9000/")
            .with_queue_capacity(10)
            .with_batch_size(4)
            .with_flush_interval(Duration::from_millis(250))
            .with_max_retry_attempts(5)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(8))
            .with_wire_format(WireFormat::NdJson)
            .with_tag("ios");

        assert_eq!(cfg.queue_capacity, 10);
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.max_retry_attempts, 5);
        assert_eq!(cfg.tags, vec!["ios"]);
        assert_eq!(cfg.normalized().endpoint, "http://127.0.0.1:9000");
    }

    #[test]
    fn normalized_enforces_minimums() {
        let cfg = LogglyConfig::default()
            .with_queue_capacity(0)
            .with_batch_size(0)
            .with_flush_interval(Duration::ZERO)
            .with_max_retry_attempts(0)
            .with_backoff(Duration::from_secs(2), Duration::from_secs(1))
            .normalized();

        assert_eq!(cfg.queue_capacity, 1);
        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.flush_interval, Duration::from_millis(10));
        assert_eq!(cfg.max_retry_attempts, 1);
        assert_eq!(cfg.max_backoff, Duration::from_secs(2));
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let cfg = LogglyConfig::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(cfg.backoff_for(1), Duration::from_millis(100));
        assert_eq!(cfg.backoff_for(2), Duration::from_millis(200));
        assert_eq!(cfg.backoff_for(3), Duration::from_millis(400));
        assert_eq!(cfg.backoff_for(4), Duration::from_millis(500));
        assert_eq!(cfg.backoff_for(64), Duration::from_millis(500));
    }
}
