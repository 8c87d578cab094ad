//! Contracts of the client service registry a connection binds to.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vdb_security::SecurityHelper;

use crate::error::ClientError;
use crate::hub::ServiceHub;
use crate::models::VdbKey;

/// Receives VDB deployment notifications.
pub trait VdbLifecycleListener: Send + Sync {
    fn added(&self, _vdb: &VdbKey) {}

    /// The VDB finished loading and accepts sessions.
    fn finished_deployment(&self, _vdb: &VdbKey) {}

    fn removed(&self, _vdb: &VdbKey) {}
}

/// Source of VDB lifecycle notifications.
pub trait VdbRepository: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn VdbLifecycleListener>);

    /// Remove a listener previously added (matched by identity).
    fn remove_listener(&self, listener: &Arc<dyn VdbLifecycleListener>);
}

/// Registry bound to a transport, resolving capabilities to implementations.
///
/// Shared, read-mostly: connections only read from it per call and never
/// manage its lifecycle.
#[async_trait]
pub trait ClientServiceRegistry: Send + Sync {
    /// Capability implementations served by this registry.
    fn services(&self) -> &ServiceHub;

    /// Active security-association mechanism.
    fn security_helper(&self) -> Arc<dyn SecurityHelper>;

    /// Wait until `vdb` is deployed and ready to accept sessions.
    ///
    /// # Errors
    ///
    /// - `Connection` if the VDB did not become ready within `timeout`
    /// - `Communication` if readiness cannot be determined
    async fn wait_for_finished(&self, vdb: &VdbKey, timeout: Duration) -> Result<(), ClientError>;

    /// VDB lifecycle notification source, if this registry has one.
    fn vdb_repository(&self) -> Option<Arc<dyn VdbRepository>> {
        None
    }
}
