//! Error types returned by the client and its sinks.

use thiserror::Error;

/// Problems with how the client was configured or initialized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `initialize` was called with an empty or whitespace-only token.
    #[error("customer token must not be empty")]
    EmptyToken,

    /// A log call was made before `initialize` set a token.
    #[error("client is not initialized with a customer token")]
    NotInitialized,

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    /// The HTTP client could not be built (TLS backend, system config).
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),
}

/// A message template did not match its argument list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A conversion needed an argument but none was left.
    #[error("missing argument for conversion {index} ('%{conversion}')")]
    MissingArgument { index: usize, conversion: char },

    /// The argument cannot be rendered by the conversion.
    #[error("argument {index} is a {found}, which '%{conversion}' cannot render")]
    TypeMismatch {
        index: usize,
        conversion: char,
        found: &'static str,
    },

    /// Unknown conversion character.
    #[error("unsupported conversion '%{0}'")]
    UnsupportedConversion(char),

    /// The template ended in the middle of a conversion specification.
    #[error("template ends inside a conversion specification")]
    Truncated,

    /// A field width or precision, literal or taken from `*`, is above
    /// the supported maximum.
    #[error("field width or precision {value} exceeds the limit of {limit}")]
    FieldTooLarge { value: u64, limit: usize },
}

/// Error returned from the logging entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Failure to deliver a batch to the collector.
///
/// These never reach application code: the transmitter logs them and
/// retries or drops the batch.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport-level failure (connect, TLS, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The collector answered with a non-success status.
    #[error("collector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The batch could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other sink-specific failure.
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::Network(e.to_string())
    }
}
