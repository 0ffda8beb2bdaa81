//! Client for shipping log messages to Loggly.
//!
//! A [`Loggly`] handle renders printf-style messages, attaches the global
//! fields and tags, and pushes records onto a bounded queue. A background
//! Tokio task drains the queue in batches and posts them to the bulk
//! endpoint with retry and backoff, so logging never waits on the network.
//!
//! ```no_run
//! use loggly_sink::{fargs, Loggly, LogglyConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let loggly = Loggly::new(LogglyConfig::default())?;
//! loggly.initialize("customer-token")?;
//! loggly.fields().insert("env", "prod");
//! loggly.tags().add("ios");
//!
//! loggly.log("user %s signed in after %d attempts", &fargs!["alice", 3])?;
//! loggly.log_with_level(3, "disk %.1f%% full", &fargs![97.5])?;
//!
//! loggly.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod format;
pub mod init;
pub mod layer;
pub mod noop_sink;
pub mod queue;
pub mod record;
pub mod sink;
pub mod state;
pub mod stats;
pub mod transmitter;
pub mod wire;

#[cfg(feature = "http")]
pub mod loggly;

pub use client::Loggly;
pub use config::LogglyConfig;
pub use error::{ConfigError, DeliveryError, FormatError, LogError};
pub use format::FormatArg;
pub use record::{Level, LogRecord};
pub use sink::LogSink;
pub use stats::StatsSnapshot;
pub use transmitter::WorkerState;
pub use wire::WireFormat;

#[cfg(feature = "http")]
pub use loggly::LogglySink;
