//! Setup-time errors.
//!
//! Registration of a malformed matcher fails here, at configuration time.
//! Nothing in this crate errors on the query path; query-time problems are
//! handled by failing open instead.

use thiserror::Error;

/// Errors raised while building the configuration registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// A key matcher was declared with an empty key.
    #[error("matcher key must not be empty")]
    EmptyKey,

    /// A URL matcher could not be parsed into comparable components.
    #[error("malformed matcher url: {0}")]
    MalformedUrl(String),

    /// An options matcher declared no key/value pairs; it would match every
    /// connection and shadow all later registrations.
    #[error("options matcher must declare at least one key")]
    EmptyOptions,
}
