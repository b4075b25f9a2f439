//! Per-connection resolved tracing state.

use std::collections::BTreeMap;

use crate::descriptor::ConnectionDescriptor;
use crate::registry::Registry;
use crate::tracer::Tracer;

/// A connection's resolved, immutable tracing snapshot.
///
/// Built once in the connection's construction path, before any query can
/// run, and reused for every query on that connection. Registry changes
/// after construction never affect an existing pin.
#[derive(Debug, Clone)]
pub struct Pin {
    /// Service name spans on this connection report under.
    pub service_name: String,
    /// Driver family, e.g. "mysql2" or "sqlite3".
    pub adapter_name: String,
    /// Tracer spans on this connection are opened through.
    pub tracer: Tracer,
    /// Tags stamped onto every span for this connection.
    pub extra_tags: BTreeMap<String, String>,
}

impl Pin {
    /// Resolve a descriptor against the registry and snapshot the result.
    ///
    /// Resolution is total: no matching entry means the default
    /// configuration, and a default with no service name falls back to the
    /// adapter name, so a usable pin always comes back.
    pub fn resolve(
        registry: &Registry,
        descriptor: &ConnectionDescriptor,
        adapter_name: &str,
    ) -> Self {
        let config = registry.resolve(descriptor);
        let service_name = if config.service_name.is_empty() {
            adapter_name.to_string()
        } else {
            config.service_name.clone()
        };

        Self {
            service_name,
            adapter_name: adapter_name.to_string(),
            tracer: config.tracer.clone().unwrap_or_default(),
            extra_tags: config.extra_tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::descriptor::{ConnectionDescriptor, DescriptorSource};
    use crate::registry::MatcherSpec;

    #[test]
    fn empty_service_name_falls_back_to_adapter() {
        let registry = Registry::new();
        let descriptor = ConnectionDescriptor::normalize(&DescriptorSource::key("anything"));

        let pin = Pin::resolve(&registry, &descriptor, "sqlite3");
        assert_eq!(pin.service_name, "sqlite3");
        assert_eq!(pin.adapter_name, "sqlite3");
    }

    #[test]
    fn pin_is_a_snapshot_across_reset() {
        let registry = Registry::new();
        registry
            .register(MatcherSpec::key("gadget"), DatabaseConfig::new("gadget-db"))
            .unwrap();
        let descriptor = ConnectionDescriptor::normalize(&DescriptorSource::key("gadget"));

        let pin = Pin::resolve(&registry, &descriptor, "mysql2");
        registry.reset();

        assert_eq!(pin.service_name, "gadget-db");
    }
}
