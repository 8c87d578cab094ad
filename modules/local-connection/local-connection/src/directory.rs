//! Directory of client service registries, keyed by transport.

use std::collections::HashMap;
use std::sync::Arc;

use local_connection_sdk::{ClientServiceRegistry, CommunicationError};
use parking_lot::RwLock;

/// Naming context under which transports publish their registry.
pub const RUNTIME_CONTEXT: &str = "runtime/queryengine";

/// Binding name of the registry served by `transport`.
#[must_use]
pub fn registry_binding_name(transport: &str) -> String {
    format!("{RUNTIME_CONTEXT}/{transport}")
}

/// Process-wide lookup of the registries transports have bound.
#[derive(Default)]
pub struct TransportDirectory {
    bindings: RwLock<HashMap<String, Arc<dyn ClientServiceRegistry>>>,
}

impl TransportDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `registry` for `transport`, replacing any previous binding.
    pub fn bind(&self, transport: &str, registry: Arc<dyn ClientServiceRegistry>) {
        let name = registry_binding_name(transport);
        tracing::debug!(binding = %name, "registry bound");
        self.bindings.write().insert(name, registry);
    }

    /// Remove the binding for `transport`, returning whether one existed.
    pub fn unbind(&self, transport: &str) -> bool {
        self.bindings
            .write()
            .remove(&registry_binding_name(transport))
            .is_some()
    }

    /// Look up the registry served by `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicationError`] if no registry is bound for `transport`.
    pub fn resolve(
        &self,
        transport: &str,
    ) -> Result<Arc<dyn ClientServiceRegistry>, CommunicationError> {
        let name = registry_binding_name(transport);
        self.bindings.read().get(&name).cloned().ok_or_else(|| {
            CommunicationError::new(format!("no registry bound for transport '{transport}' ({name})"))
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use local_connection_sdk::{ClientError, ServiceHub, VdbKey};
    use vdb_security::{LocalSecurityHelper, SecurityHelper};

    use super::*;

    #[derive(Default)]
    struct EmptyRegistry {
        hub: ServiceHub,
    }

    #[async_trait]
    impl ClientServiceRegistry for EmptyRegistry {
        fn services(&self) -> &ServiceHub {
            &self.hub
        }

        fn security_helper(&self) -> Arc<dyn SecurityHelper> {
            Arc::new(LocalSecurityHelper::new())
        }

        async fn wait_for_finished(&self, _vdb: &VdbKey, _timeout: Duration) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[test]
    fn binding_name_is_scoped_by_transport() {
        assert_eq!(registry_binding_name("local"), "runtime/queryengine/local");
    }

    #[test]
    fn resolves_bound_registry() {
        let directory = TransportDirectory::new();
        directory.bind("local", Arc::new(EmptyRegistry::default()));

        assert!(directory.resolve("local").is_ok());
        assert!(directory.unbind("local"));
        assert!(!directory.unbind("local"));
    }

    #[test]
    fn missing_transport_is_a_communication_error() {
        let directory = TransportDirectory::new();

        let err = directory.resolve("embedded").err().unwrap();
        assert!(err.message().contains("embedded"));
        assert!(err.message().contains("runtime/queryengine/embedded"));
    }
}
