//! Client-facing local connection.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use local_connection_sdk::{
    Capability, ClientError, ClientServiceRegistry, ComponentError, ConnectionError,
    ConnectionProperties, LogonResult, LogonService, ServerConnection, SessionContext,
    VdbLifecycleListener,
};

use super::dispatch::{ConnectionCore, ServiceHandle};
use super::lifecycle::ConnectionState;
use crate::config::LocalConnectionConfig;
use crate::directory::TransportDirectory;
use crate::version::server_version;

/// A session with the in-process engine.
///
/// An owning connection creates its [`SessionContext`], authenticates it on
/// open and logs it off on close. A derived connection (opened with
/// [`ConnectionProperties::with_session_context`]) borrows another
/// connection's session: it adopts that session's identity, always reconciles
/// the caller's identity, and never logs the session off.
pub struct LocalConnection {
    core: Arc<ConnectionCore>,
}

impl LocalConnection {
    /// Open a connection on the transport named in `properties`.
    ///
    /// For owning connections, waits for the target VDB to finish loading when
    /// an exact version and a wait bound are configured, then authenticates.
    /// `use_calling_task` selects whether capability calls run on the caller's
    /// task or on a spawned one; derived connections inherit the borrowed
    /// session's choice.
    ///
    /// # Errors
    ///
    /// - `Connection` if a property is malformed, the logon is rejected, or
    ///   the borrowed session was never established
    /// - `Communication` if no registry is bound for the transport or the
    ///   engine cannot be reached
    #[tracing::instrument(skip_all)]
    pub async fn open(
        directory: &TransportDirectory,
        properties: ConnectionProperties,
        use_calling_task: bool,
    ) -> Result<Self, ClientError> {
        let config = LocalConnectionConfig::from_properties(&properties)?;
        let registry = directory.resolve(&config.transport_name)?;

        match properties.session_context().cloned() {
            Some(session) => Self::derive(registry, session, properties, &config),
            None => Self::establish(registry, properties, &config, use_calling_task).await,
        }
    }

    fn derive(
        registry: Arc<dyn ClientServiceRegistry>,
        session: Arc<SessionContext>,
        properties: ConnectionProperties,
        config: &LocalConnectionConfig,
    ) -> Result<Self, ClientError> {
        let Some(session_token) = session.session_token() else {
            return Err(ConnectionError::new(
                "cannot derive a connection from a session that was never established",
            )
            .into());
        };

        let core = Arc::new(ConnectionCore::new(
            registry,
            Arc::clone(&session),
            properties,
            config,
            true,
        ));
        core.auth.replace(LogonResult {
            session_token,
            vdb_name: session.vdb_name().unwrap_or_default(),
            vdb_version: None,
            payload: None,
        });
        core.lifecycle.advance(ConnectionState::Active);

        tracing::info!(
            transport = %config.transport_name,
            session_id = ?session.session_id(),
            "derived connection opened"
        );
        Ok(Self { core })
    }

    async fn establish(
        registry: Arc<dyn ClientServiceRegistry>,
        properties: ConnectionProperties,
        config: &LocalConnectionConfig,
        use_calling_task: bool,
    ) -> Result<Self, ClientError> {
        let session = Arc::new(SessionContext::new(
            registry.security_helper(),
            use_calling_task,
        ));
        let core = Arc::new(ConnectionCore::new(
            Arc::clone(&registry),
            session,
            properties,
            config,
            false,
        ));
        core.lifecycle.advance(ConnectionState::Authenticating);

        if let Some(vdb) = config.vdb_key()
            && !vdb.is_at_most()
            && let Some(wait) = config.ready_wait
        {
            tracing::debug!(
                vdb = %vdb,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "waiting for vdb to finish loading"
            );
            registry.wait_for_finished(&vdb, wait).await?;
        }

        if let Err(e) = core.authenticate().await {
            core.shutdown(false).await;
            return Err(e);
        }
        core.lifecycle.advance(ConnectionState::Active);

        tracing::info!(
            transport = %config.transport_name,
            session_id = ?core.session.session_id(),
            passthrough = core.passthrough,
            "connection opened"
        );
        Ok(Self { core })
    }

    /// Handle for capability `C`.
    #[must_use]
    pub fn service<C: Capability + ?Sized>(&self) -> ServiceHandle<C> {
        ServiceHandle::new(Arc::clone(&self.core))
    }

    /// Log off the current session and log on again.
    ///
    /// # Errors
    ///
    /// - `Component` if the connection is closed
    /// - `Connection` if the logon is rejected (message verbatim)
    /// - `Communication` for any other backend failure
    pub async fn authenticate(&self) -> Result<(), ClientError> {
        if self.core.lifecycle.is_closed() {
            return Err(ComponentError::closed().into());
        }
        self.core.authenticate().await
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.core.lifecycle.state()
    }

    /// The session bound to this connection; pass it to
    /// [`ConnectionProperties::with_session_context`] to derive connections.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.core.session
    }

    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.core.derived
    }

    /// Register for VDB lifecycle notifications. No-op when the registry has
    /// no VDB repository.
    pub fn add_listener(&self, listener: Arc<dyn VdbLifecycleListener>) {
        if let Some(repository) = self.core.registry.vdb_repository() {
            repository.add_listener(listener);
        }
    }

    pub fn remove_listener(&self, listener: &Arc<dyn VdbLifecycleListener>) {
        if let Some(repository) = self.core.registry.vdb_repository() {
            repository.remove_listener(listener);
        }
    }
}

impl ConnectionCore {
    /// Move to `Closed`, logging off first if `logoff` is set. Only the first
    /// call has any effect.
    pub(super) async fn shutdown(self: &Arc<Self>, logoff: bool) {
        if !self.lifecycle.begin_shutdown() {
            return;
        }
        if logoff {
            self.logoff().await;
        }
        if !self.derived {
            self.session.close_session();
        }
        self.lifecycle.finish_shutdown();
        tracing::info!(
            transport = %self.transport,
            session_id = ?self.session.session_id(),
            "connection closed"
        );
    }
}

#[async_trait]
impl ServerConnection for LocalConnection {
    async fn is_open(&self, timeout: Duration) -> bool {
        if self.core.lifecycle.is_closed() {
            return false;
        }
        match tokio::time::timeout(timeout, self.service::<dyn LogonService>().ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "ping failed, reporting connection as not open");
                false
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "ping timed out, reporting connection as not open"
                );
                false
            }
        }
    }

    async fn close(&self) {
        self.core.shutdown(true).await;
    }

    fn logon_result(&self) -> Option<Arc<LogonResult>> {
        self.core.auth.current()
    }

    fn is_same_instance(&self, other: &dyn ServerConnection) -> Result<bool, ClientError> {
        Ok(other.as_any().is::<Self>())
    }

    fn supports_continuous(&self) -> bool {
        true
    }

    fn is_local(&self) -> bool {
        true
    }

    fn server_version(&self) -> &str {
        server_version()
    }

    fn clean_up(&self) {
        if !self.core.derived {
            self.core.session.set_security_context(None);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for LocalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalConnection")
            .field("transport", &self.core.transport)
            .field("state", &self.state())
            .field("derived", &self.core.derived)
            .field("passthrough", &self.core.passthrough)
            .field("session", &self.core.session)
            .finish_non_exhaustive()
    }
}
