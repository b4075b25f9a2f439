//! Per-database tracing configuration.

use std::collections::BTreeMap;

use crate::tracer::Tracer;

/// Configuration attached to one logical database.
///
/// Created by the host during setup, owned by the registry for the process
/// lifetime, and never mutated once registered.
///
/// # Example
///
/// ```rust
/// use multidb_tracing::DatabaseConfig;
///
/// let config = DatabaseConfig::new("orders-db")
///     .with_tag("team", "payments");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Logical service name under which spans for this database are reported.
    /// When empty, spans fall back to the connection's adapter name.
    pub service_name: String,

    /// Tracer handle used for spans on connections resolved to this
    /// configuration. `None` means the process-wide default tracer.
    pub tracer: Option<Tracer>,

    /// Extra tags stamped onto every span for this database.
    pub extra_tags: BTreeMap<String, String>,
}

impl DatabaseConfig {
    /// Create a configuration reporting under the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Route spans for this database through a specific tracer.
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Add a tag applied to every span for this database.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_tags.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = DatabaseConfig::new("widget-db").with_tag("env", "test");

        assert_eq!(config.service_name, "widget-db");
        assert!(config.tracer.is_none());
        assert_eq!(config.extra_tags.get("env").map(String::as_str), Some("test"));
    }

    #[test]
    fn default_has_no_service_name() {
        let config = DatabaseConfig::default();
        assert!(config.service_name.is_empty());
    }
}
