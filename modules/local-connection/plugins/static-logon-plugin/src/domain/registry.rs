//! In-process client service registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use local_connection_sdk::{
    ClientError, ClientServiceRegistry, LogonService, QueryService, ServiceHub, VdbKey,
    VdbRepository,
};
use vdb_security::SecurityHelper;

use super::logon::StaticLogonService;
use super::query::StaticQueryService;
use super::repository::InMemoryVdbRepository;
use crate::config::StaticLogonPluginConfig;

/// Registry serving the static logon and query services in-process.
pub struct LocalServiceRegistry {
    hub: ServiceHub,
    security_helper: Arc<dyn SecurityHelper>,
    repository: Arc<InMemoryVdbRepository>,
    logon: Arc<StaticLogonService>,
    query: Arc<StaticQueryService>,
}

impl LocalServiceRegistry {
    #[must_use]
    pub fn from_config(
        cfg: &StaticLogonPluginConfig,
        security_helper: Arc<dyn SecurityHelper>,
    ) -> Self {
        let logon = Arc::new(StaticLogonService::from_config(cfg));
        let query = Arc::new(StaticQueryService::new());

        let hub = ServiceHub::new();
        hub.register::<dyn LogonService>(logon.clone());
        hub.register::<dyn QueryService>(query.clone());

        Self {
            hub,
            security_helper,
            repository: Arc::new(InMemoryVdbRepository::new()),
            logon,
            query,
        }
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<InMemoryVdbRepository> {
        &self.repository
    }

    #[must_use]
    pub fn logon_service(&self) -> &Arc<StaticLogonService> {
        &self.logon
    }

    #[must_use]
    pub fn query_service(&self) -> &Arc<StaticQueryService> {
        &self.query
    }
}

#[async_trait]
impl ClientServiceRegistry for LocalServiceRegistry {
    fn services(&self) -> &ServiceHub {
        &self.hub
    }

    fn security_helper(&self) -> Arc<dyn SecurityHelper> {
        Arc::clone(&self.security_helper)
    }

    async fn wait_for_finished(&self, vdb: &VdbKey, timeout: Duration) -> Result<(), ClientError> {
        self.repository.wait_for_finished(vdb, timeout).await
    }

    fn vdb_repository(&self) -> Option<Arc<dyn VdbRepository>> {
        Some(self.repository.clone())
    }
}
