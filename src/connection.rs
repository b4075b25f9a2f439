//! Traced connection wrapper and the driver boundary it decorates.

use async_trait::async_trait;
use tracing::{field, Instrument};

use crate::descriptor::{ConnectionDescriptor, DescriptorSource};
use crate::parser;
use crate::pin::Pin;
use crate::registry::Registry;
use crate::tracer::SPAN_KIND_CLIENT;

/// Span name used for every query span.
pub const QUERY_SPAN_NAME: &str = "db.query";

/// A query handed to the driver: raw SQL text, or a pre-built statement
/// whose text may be unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: Option<String>,
}

impl Statement {
    /// A statement from raw SQL text.
    pub fn from_string(sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
        }
    }

    /// A pre-built statement with no textual representation. Its spans use
    /// a fixed placeholder resource.
    pub fn opaque() -> Self {
        Self { sql: None }
    }

    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }
}

/// Outcome of a successful query execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }
}

/// The single query-execution primitive this crate wraps.
///
/// Implemented by the host over its real database driver; the wrapper
/// delegates here and never reimplements execution.
#[async_trait]
pub trait QueryDriver: Send + Sync {
    /// The driver's own error type, propagated through the wrapper
    /// unchanged.
    type Error: std::fmt::Display + Send;

    /// Driver family name, e.g. "mysql2", "sqlite3", "postgres".
    fn adapter_name(&self) -> &str;

    async fn raw_execute(&self, statement: &Statement) -> Result<ExecResult, Self::Error>;
}

/// A driver wrapped with query-span instrumentation.
///
/// Implements [`QueryDriver`] itself, so it is a drop-in replacement for the
/// inner driver. The resolved [`Pin`] is an explicit field populated at
/// construction; a connection without one executes untraced.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::new();
/// registry.set_default(DatabaseConfig::new("default-db"));
///
/// let conn = TracedConnection::connect(driver, &DescriptorSource::key("gadget"), &registry);
/// let result = conn.raw_execute(&Statement::from_string("SELECT 1")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TracedConnection<D> {
    inner: D,
    pin: Option<Pin>,
}

impl<D: QueryDriver> TracedConnection<D> {
    /// Wrap a driver, resolving its descriptor against the registry.
    ///
    /// The pin is resolved here, once, before any query can run; later
    /// registry changes do not affect this connection.
    pub fn connect(inner: D, source: &DescriptorSource, registry: &Registry) -> Self {
        let descriptor = ConnectionDescriptor::normalize(source);
        let pin = Pin::resolve(registry, &descriptor, inner.adapter_name());
        Self {
            inner,
            pin: Some(pin),
        }
    }

    /// Wrap a driver with no tracing state attached. Queries execute
    /// untraced; the fail-open path when instrumentation setup is skipped
    /// or failed.
    pub fn untraced(inner: D) -> Self {
        Self { inner, pin: None }
    }

    /// The resolved tracing snapshot, when one is attached.
    pub fn pin(&self) -> Option<&Pin> {
        self.pin.as_ref()
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

#[async_trait]
impl<D: QueryDriver> QueryDriver for TracedConnection<D> {
    type Error = D::Error;

    fn adapter_name(&self) -> &str {
        self.inner.adapter_name()
    }

    async fn raw_execute(&self, statement: &Statement) -> Result<ExecResult, Self::Error> {
        // No pin: instrumentation was never attached. The query must still
        // run, untraced.
        let pin = match &self.pin {
            Some(pin) => pin,
            None => return self.inner.raw_execute(statement).await,
        };

        let resource = parser::resource_for(statement);
        let operation = parser::parse_operation(&resource);

        let mut span = pin.tracer.start_span(QUERY_SPAN_NAME);
        span.set_service(pin.service_name.as_str());
        span.set_resource(resource.as_str());
        span.tag("db.system", pin.adapter_name.as_str());
        span.tag("db.operation", operation.as_str());
        for (key, value) in &pin.extra_tags {
            span.tag(key.as_str(), value.as_str());
        }

        let query_span = tracing::info_span!(
            "db.query",
            otel.kind = SPAN_KIND_CLIENT,
            service.name = %pin.service_name,
            db.system = %pin.adapter_name,
            db.operation = %operation,
            db.rows_affected = field::Empty,
            otel.status_code = field::Empty,
            error.message = field::Empty,
        );

        let result = self
            .inner
            .raw_execute(statement)
            .instrument(query_span.clone())
            .await;

        match &result {
            Ok(exec) => {
                query_span.record("db.rows_affected", exec.rows_affected);
                query_span.record("otel.status_code", "OK");
                span.tag("db.rows_affected", exec.rows_affected.to_string());
            }
            Err(e) => {
                query_span.record("otel.status_code", "ERROR");
                query_span.record("error.message", e.to_string().as_str());
                span.set_error(e.to_string());
            }
        }

        // `span` drops here and is exported exactly once; the driver's
        // result passes through untouched on both paths.
        result
    }
}

/// Extension trait for wrapping drivers at their construction site.
pub trait TracingExt: QueryDriver + Sized {
    /// Wrap this driver with query tracing resolved from the registry.
    fn with_tracing(self, source: &DescriptorSource, registry: &Registry)
        -> TracedConnection<Self>;
}

impl<D: QueryDriver + Sized> TracingExt for D {
    fn with_tracing(
        self,
        source: &DescriptorSource,
        registry: &Registry,
    ) -> TracedConnection<Self> {
        TracedConnection::connect(self, source, registry)
    }
}
