use crate::client::Loggly;
use crate::record::Level;
use crate::transmitter::is_delivering;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Target prefix of this crate's own diagnostics. Events under it are
/// never forwarded, otherwise a delivery failure would log itself into
/// the queue it failed to empty.
const OWN_TARGET: &str = "loggly_sink";

/// Crates underneath the HTTP transport. Their events are raised on
/// connection tasks the worker does not own, so they are filtered by
/// target.
const TRANSPORT_TARGETS: &[&str] = &[
    "hyper", "h2", "reqwest", "rustls", "tokio", "tokio_util", "tower", "want", "mio",
];

fn is_suppressed_target(target: &str) -> bool {
    std::iter::once(OWN_TARGET)
        .chain(TRANSPORT_TARGETS.iter().copied())
        .any(|prefix| {
            target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
}

/// `tracing_subscriber` layer that turns `tracing` events into Loggly
/// records through a [`Loggly`] client.
///
/// Only events at or above `min_level` are forwarded. Event fields are
/// layered over the client's global fields on that record only. Events
/// seen before the client is initialized are discarded, and so are events
/// raised while a batch is being delivered.
pub struct LogglyLayer {
    client: Loggly,
    min_level: tracing::Level,
}

impl LogglyLayer {
    pub fn new(client: Loggly, min_level: tracing::Level) -> Self {
        LogglyLayer { client, min_level }
    }
}

impl<S> Layer<S> for LogglyLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > self.min_level || is_suppressed_target(meta.target()) || is_delivering() {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let _ = self.client.log_structured(
            Level::from(meta.level()),
            message.unwrap_or_default(),
            fields,
        );
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `info!("text")` records its message through this method.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
