//! Tracer handle and span lifecycle.
//!
//! A [`Span`] bounds exactly one unit of work. It is opened through a
//! [`Tracer`], mutated while the work runs, and exported to the tracer's
//! [`SpanSink`] when dropped. Export happens in `Drop`, so a span is
//! finalized exactly once on every exit path, including early returns,
//! panics, and cancelled futures.
//!
//! Span transport is out of scope here: a sink receives the finished
//! [`SpanRecord`] and does whatever the host wires it to. The default sink
//! mirrors finished spans to `tracing` events so query telemetry is visible
//! through the host's subscriber with no further setup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Span kind recorded on every query span.
pub const SPAN_KIND_CLIENT: &str = "client";

const LOG_TARGET: &str = "multidb_tracing";

/// A finished span, handed to a [`SpanSink`] for export.
#[derive(Debug, Clone)]
pub struct SpanRecord {
    /// Instrumentation-family span name, e.g. `db.query`.
    pub name: String,
    /// Logical service the span is attributed to.
    pub service: String,
    /// Normalized query text (or placeholder) this span covers.
    pub resource: String,
    /// Span kind; always [`SPAN_KIND_CLIENT`] for query spans.
    pub kind: &'static str,
    pub tags: BTreeMap<String, String>,
    /// Wall-clock start of the span.
    pub started_at: SystemTime,
    pub duration: Duration,
    pub error: bool,
    pub error_message: Option<String>,
}

/// Receiver for finished spans. Implementations must tolerate concurrent
/// export from many connections.
pub trait SpanSink: Send + Sync + fmt::Debug {
    fn export(&self, span: SpanRecord);
}

/// Default sink: emits one `tracing` event per finished span.
#[derive(Debug, Default)]
pub struct LogSink;

impl SpanSink for LogSink {
    fn export(&self, span: SpanRecord) {
        let duration_ms = span.duration.as_millis() as u64;
        if span.error {
            tracing::error!(
                target: LOG_TARGET,
                span_name = %span.name,
                service = %span.service,
                resource = %span.resource,
                duration_ms,
                error_message = span.error_message.as_deref().unwrap_or(""),
                "database query failed"
            );
        } else {
            tracing::debug!(
                target: LOG_TARGET,
                span_name = %span.name,
                service = %span.service,
                resource = %span.resource,
                duration_ms,
                "database query finished"
            );
        }
    }
}

/// A live span. Mutable until dropped; exported exactly once on drop.
#[derive(Debug)]
pub struct Span {
    record: SpanRecord,
    started: Instant,
    sink: Option<Arc<dyn SpanSink>>,
}

impl Span {
    fn start(name: &str, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            record: SpanRecord {
                name: name.to_string(),
                service: String::new(),
                resource: String::new(),
                kind: SPAN_KIND_CLIENT,
                tags: BTreeMap::new(),
                started_at: SystemTime::now(),
                duration: Duration::ZERO,
                error: false,
                error_message: None,
            },
            started: Instant::now(),
            sink: Some(sink),
        }
    }

    pub fn set_service(&mut self, service: impl Into<String>) {
        self.record.service = service.into();
    }

    pub fn set_resource(&mut self, resource: impl Into<String>) {
        self.record.resource = resource.into();
    }

    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.record.tags.insert(key.into(), value.into());
    }

    /// Flag the span as failed with a best-effort message.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.record.error = true;
        self.record.error_message = Some(message.into());
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            self.record.duration = self.started.elapsed();
            let record = self.record.clone();
            // A faulting sink loses the span, never the caller's query.
            // Export can also run mid-unwind, where a second panic would
            // abort the process.
            let export = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                sink.export(record)
            }));
            if export.is_err() {
                tracing::warn!(target: LOG_TARGET, "span export panicked; span dropped");
            }
        }
    }
}

/// Handle through which spans are opened and exported.
///
/// Cheap to clone; clones share the same sink. The default tracer exports
/// through [`LogSink`].
#[derive(Clone)]
pub struct Tracer {
    sink: Arc<dyn SpanSink>,
}

impl Tracer {
    pub fn new(sink: Arc<dyn SpanSink>) -> Self {
        Self { sink }
    }

    /// Open a span that will export to this tracer's sink when dropped.
    pub fn start_span(&self, name: &str) -> Span {
        Span::start(name, Arc::clone(&self.sink))
    }

    /// Run `f` inside a span. The closure's return value is passed through
    /// and the span is finalized after the closure, regardless of outcome.
    pub fn trace<R>(&self, name: &str, f: impl FnOnce(&mut Span) -> R) -> R {
        let mut span = self.start_span(name);
        f(&mut span)
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("sink", &self.sink).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct RecordingSink {
        spans: Mutex<Vec<SpanRecord>>,
    }

    impl SpanSink for RecordingSink {
        fn export(&self, span: SpanRecord) {
            self.spans.lock().push(span);
        }
    }

    #[test]
    fn trace_returns_closure_value_and_exports_once() {
        let sink = Arc::new(RecordingSink::default());
        let tracer = Tracer::new(sink.clone());

        let out = tracer.trace("db.query", |span| {
            span.set_service("widget-db");
            span.set_resource("SELECT 1");
            42
        });

        assert_eq!(out, 42);
        let spans = sink.spans.lock();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].service, "widget-db");
        assert_eq!(spans[0].kind, SPAN_KIND_CLIENT);
        assert!(!spans[0].error);
    }

    #[test]
    fn span_exports_on_early_return() {
        let sink = Arc::new(RecordingSink::default());
        let tracer = Tracer::new(sink.clone());

        fn inner(tracer: &Tracer) -> Result<(), String> {
            let mut span = tracer.start_span("db.query");
            span.set_error("boom");
            Err("boom".to_string())
        }

        assert!(inner(&tracer).is_err());
        let spans = sink.spans.lock();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].error);
        assert_eq!(spans[0].error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn panicking_sink_does_not_reach_the_caller() {
        #[derive(Debug)]
        struct PanickingSink;

        impl SpanSink for PanickingSink {
            fn export(&self, _span: SpanRecord) {
                panic!("sink exploded during export");
            }
        }

        let tracer = Tracer::new(Arc::new(PanickingSink));

        let out = tracer.trace("db.query", |span| {
            span.set_service("widget-db");
            "result"
        });

        assert_eq!(out, "result");
    }

    #[test]
    fn span_exports_on_panic() {
        let sink = Arc::new(RecordingSink::default());
        let tracer = Tracer::new(sink.clone());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tracer.trace("db.query", |_span| panic!("driver exploded"))
        }));

        assert!(result.is_err());
        assert_eq!(sink.spans.lock().len(), 1);
    }
}
