use crate::config::LogglyConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::record::LogRecord;
use crate::sink::LogSink;
use crate::wire::{encode_batch, WireFormat};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// Loggly implementation of [`LogSink`] using the HTTP bulk endpoint.
///
/// Every batch is a single POST to `{endpoint}/bulk/{token}/`, with the
/// token percent-encoded into the path as the collector expects.
#[derive(Clone, Debug)]
pub struct LogglySink {
    client: Client,
    endpoint: String,
    wire_format: WireFormat,
}

impl LogglySink {
    /// Construct a sink from the endpoint, request timeout and wire format
    /// of `config`.
    ///
    /// **Errors**
    /// - [`ConfigError::HttpClient`] if reqwest cannot build its client.
    pub fn new(config: &LogglyConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            wire_format: config.wire_format,
        })
    }

    pub fn bulk_url(&self, token: &str) -> String {
        format!("{}/bulk/{}/", self.endpoint, urlencoding::encode(token))
    }
}

#[async_trait]
impl LogSink for LogglySink {
    async fn send_batch(&self, token: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        let body = encode_batch(records, self.wire_format)?;
        let resp = self
            .client
            .post(self.bulk_url(token))
            .header(CONTENT_TYPE, self.wire_format.content_type())
            .body(body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(DeliveryError::Status { status, body })
        }
    }
}
