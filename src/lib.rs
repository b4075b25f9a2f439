//! # multidb-tracing
//!
//! Per-database service attribution and span instrumentation for database
//! clients.
//!
//! When one process talks to several logical databases, spans for each
//! should report under their own service name. This crate owns the part
//! that makes that work: describing databases at setup time, resolving each
//! connection to its configuration, and wrapping every query execution in
//! exactly one span tagged with the right service.
//!
//! ## How it fits together
//!
//! - A [`DescriptorSource`] describes a database the way the caller has it:
//!   a logical key, a connection URL, or an options map. Normalization into
//!   a [`ConnectionDescriptor`] is total and never fails.
//! - The [`Registry`] holds ordered matcher/configuration pairs plus a
//!   default; the first matcher that applies wins, and no match means the
//!   default. Built during setup, read-only under query traffic.
//! - A [`Pin`] is the per-connection snapshot of the resolved
//!   configuration, attached once at construction and reused for every
//!   query.
//! - [`TracedConnection`] decorates the host's [`QueryDriver`] and bounds
//!   each `raw_execute` in a span: opened before the query, tagged from the
//!   pin, error-flagged if the driver fails, finalized exactly once.
//!
//! Tracing is fully transparent: driver results and errors pass through
//! unchanged, and a connection with no attached pin simply executes
//! untraced.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use multidb_tracing::prelude::*;
//!
//! let registry = Registry::new();
//! registry.set_default(DatabaseConfig::new("default-db"));
//! registry.register(
//!     MatcherSpec::url("mysql2://root@127.0.0.1:53306/mysql"),
//!     DatabaseConfig::new("gadget-db"),
//! )?;
//!
//! let conn = driver.with_tracing(
//!     &DescriptorSource::text("mysql2://root@127.0.0.1:53306/mysql"),
//!     &registry,
//! );
//! // Every query on `conn` now reports under "gadget-db".
//! let result = conn.raw_execute(&Statement::from_string("SELECT 1")).await?;
//! ```

mod config;
mod connection;
mod descriptor;
mod error;
mod parser;
mod pin;
mod registry;
mod tracer;

pub use config::DatabaseConfig;
pub use connection::{
    ExecResult, QueryDriver, Statement, TracedConnection, TracingExt, QUERY_SPAN_NAME,
};
pub use descriptor::{ConnectionDescriptor, DescriptorDetail, DescriptorSource, UrlParts};
pub use error::SetupError;
pub use parser::{parse_operation, SqlOperation, UNKNOWN_QUERY};
pub use pin::Pin;
pub use registry::{MatcherSpec, Registry};
pub use tracer::{LogSink, Span, SpanRecord, SpanSink, Tracer, SPAN_KIND_CLIENT};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DatabaseConfig, DescriptorSource, ExecResult, MatcherSpec, QueryDriver, Registry,
        Statement, TracedConnection, Tracer, TracingExt,
    };
}
