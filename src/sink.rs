use crate::error::DeliveryError;
use crate::record::LogRecord;
use async_trait::async_trait;

/// Asynchronous destination for batches of [`LogRecord`]s.
///
/// Implementations transport a batch to a concrete collector (the Loggly
/// bulk endpoint, a test double, ...). The transmitter calls `send_batch`
/// from its background task and never from an application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver one batch.
    ///
    /// **Parameters**
    /// - `token`: customer token current at the time the batch was drained.
    /// - `records`: non-empty batch, oldest record first.
    ///
    /// **Returns**
    /// - `Ok(())` if the collector accepted the batch.
    /// - `Err(..)` on any failure (network error, serialization error,
    ///   HTTP status, ...). The transmitter treats this as transient and
    ///   retries the same batch with backoff until its attempts run out.
    async fn send_batch(&self, token: &str, records: &[LogRecord]) -> Result<(), DeliveryError>;

    /// Flush anything the sink buffers on its own side.
    ///
    /// Called once after the final drain on shutdown. Default
    /// implementation is a no-op.
    async fn flush(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}
