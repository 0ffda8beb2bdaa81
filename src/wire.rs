//! Serialization of batches for the collector.

use crate::error::DeliveryError;
use crate::record::LogRecord;

/// Body layout of a bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// One JSON array holding every record of the batch.
    #[default]
    JsonArray,
    /// One JSON object per line. Loggly's bulk endpoint splits these into
    /// separate events.
    NdJson,
}

impl WireFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::JsonArray => "application/json",
            WireFormat::NdJson => "text/plain",
        }
    }

    pub fn parse(s: &str) -> Option<WireFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "json-array" | "array" => Some(WireFormat::JsonArray),
            "ndjson" | "lines" => Some(WireFormat::NdJson),
            _ => None,
        }
    }
}

/// Serialize a batch in the given layout.
pub fn encode_batch(records: &[LogRecord], format: WireFormat) -> Result<Vec<u8>, DeliveryError> {
    match format {
        WireFormat::JsonArray => Ok(serde_json::to_vec(records)?),
        WireFormat::NdJson => {
            let mut body = Vec::with_capacity(records.len() * 128);
            for record in records {
                serde_json::to_writer(&mut body, record)?;
                body.push(b'\n');
            }
            Ok(body)
        }
    }
}
