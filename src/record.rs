use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Keys written by the record itself. A global field with one of these
/// names never overrides them on the wire.
pub const RESERVED_KEYS: [&str; 4] = ["timestamp", "level", "message", "tags"];

/// Severity of a log message.
///
/// The discriminants follow the numeric levels accepted by
/// [`Loggly::log_with_level`](crate::client::Loggly::log_with_level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl Level {
    /// Map a raw numeric level onto the enumeration.
    ///
    /// Returns `Ok` for 0..=3 and `Err(nearest)` for anything outside,
    /// clamped to `Debug` below and `Error` above.
    pub fn from_raw(raw: i64) -> Result<Level, Level> {
        match raw {
            0 => Ok(Level::Debug),
            1 => Ok(Level::Info),
            2 => Ok(Level::Warning),
            3 => Ok(Level::Error),
            r if r < 0 => Err(Level::Debug),
            _ => Err(Level::Error),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// One structured log event, immutable once built.
///
/// `fields` and `tags` are copies of the client's global collections taken
/// when the record was created; later changes to the globals do not reach
/// records that are already queued.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub tags: Vec<String>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, serde_json::Value>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Flat wire shape: the fixed keys, every field inlined, then `tags`.
impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let inlined = self
            .fields
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()));

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(
            "timestamp",
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        map.serialize_entry("level", self.level.as_str())?;
        map.serialize_entry("message", &self.message)?;
        for (key, value) in inlined {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("tags", &self.tags)?;
        map.end()
    }
}
