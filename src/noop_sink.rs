use crate::error::DeliveryError;
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;

/// A sink that accepts and discards every batch.
///
/// Useful for measuring the overhead of the facade and queue without any
/// network I/O, and for tests that don't care about delivery.
#[derive(Clone, Debug, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send_batch(&self, _token: &str, _records: &[LogRecord]) -> Result<(), DeliveryError> {
        Ok(())
    }
}
