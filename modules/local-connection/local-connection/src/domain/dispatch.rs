//! Capability dispatch: the pre/post-call pipeline every call goes through.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use local_connection_sdk::{
    CANCEL_REQUEST, Capability, ClientServiceRegistry, ComponentError, ConnectionProperties,
    EXECUTE, LOGOFF, LOGON, LogonResult, LogonService, LogonServiceError, Operation, PING,
    QueryRequest, QueryService, QueryServiceError, RequestAck, SessionContext,
};

use super::auth::AuthenticationCoordinator;
use super::lifecycle::Lifecycle;
use super::translate::{Failure, translate};
use crate::config::LocalConnectionConfig;

/// State shared by a connection and every handle it hands out.
pub struct ConnectionCore {
    pub(super) registry: Arc<dyn ClientServiceRegistry>,
    pub(super) session: Arc<SessionContext>,
    pub(super) properties: ConnectionProperties,
    pub(super) transport: String,
    pub(super) passthrough: bool,
    /// Borrows another connection's session; never logs it off.
    pub(super) derived: bool,
    pub(super) lifecycle: Lifecycle,
    pub(super) auth: AuthenticationCoordinator,
}

impl ConnectionCore {
    pub(super) fn new(
        registry: Arc<dyn ClientServiceRegistry>,
        session: Arc<SessionContext>,
        properties: ConnectionProperties,
        config: &LocalConnectionConfig,
        derived: bool,
    ) -> Self {
        Self {
            registry,
            session,
            properties,
            transport: config.transport_name.clone(),
            passthrough: derived || config.passthrough,
            derived,
            lifecycle: Lifecycle::new(),
            auth: AuthenticationCoordinator::default(),
        }
    }

    /// Run `call` against the implementation of `C` bound in the registry.
    ///
    /// Per call, in order:
    /// 1. fail with a closed-connection error once the connection is closed;
    /// 2. in passthrough mode, re-authenticate if the caller's identity drifted
    ///    (skipped for the authentication capability and the cancel operation);
    /// 3. resolve the implementation;
    /// 4. run it with the session context, on this task or a spawned one;
    /// 5. translate any failure into `C`'s declared contract.
    pub async fn dispatch<C, T, F, Fut>(
        self: &Arc<Self>,
        op: Operation,
        call: F,
    ) -> Result<T, C::Error>
    where
        C: Capability + ?Sized,
        T: Send + 'static,
        F: FnOnce(Arc<C>, Arc<SessionContext>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, C::Error>> + Send + 'static,
    {
        tracing::trace!(operation = %op, "dispatching capability call");
        self.run::<C, T, F, Fut>(op, call).await.map_err(|failure| {
            let e = translate(failure);
            tracing::debug!(operation = %op, error = %e, "capability call failed");
            e
        })
    }

    async fn run<C, T, F, Fut>(
        self: &Arc<Self>,
        op: Operation,
        call: F,
    ) -> Result<T, Failure<C::Error>>
    where
        C: Capability + ?Sized,
        T: Send + 'static,
        F: FnOnce(Arc<C>, Arc<SessionContext>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, C::Error>> + Send + 'static,
    {
        if self.lifecycle.is_closed() {
            return Err(Failure::Undeclared(ComponentError::closed().into()));
        }

        if self.passthrough && !C::AUTHENTICATES && op != CANCEL_REQUEST {
            self.reconcile_identity()
                .await
                .map_err(Failure::Undeclared)?;
        }

        let service = self.registry.services().get::<C>().map_err(|e| {
            Failure::Undeclared(
                ComponentError::unavailable(format!(
                    "{} is not available on transport '{}'",
                    C::NAME,
                    self.transport
                ))
                .with_source(e)
                .into(),
            )
        })?;

        let session = Arc::clone(&self.session);
        if session.use_calling_task() {
            return call(service, session).await.map_err(Failure::Declared);
        }

        match tokio::spawn(call(service, session)).await {
            Ok(outcome) => outcome.map_err(Failure::Declared),
            Err(e) => Err(Failure::Envelope(e)),
        }
    }
}

/// Callable handle for capability `C`.
///
/// Stateless beyond the capability it stands for; cheap to create and clone.
pub struct ServiceHandle<C: ?Sized> {
    core: Arc<ConnectionCore>,
    capability: PhantomData<fn() -> Arc<C>>,
}

impl<C: ?Sized> Clone for ServiceHandle<C> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            capability: PhantomData,
        }
    }
}

impl<C: Capability + ?Sized> ServiceHandle<C> {
    pub(super) fn new(core: Arc<ConnectionCore>) -> Self {
        Self {
            core,
            capability: PhantomData,
        }
    }

    /// Run an arbitrary operation of `C` through the dispatch pipeline.
    ///
    /// # Errors
    ///
    /// The failure raised by `call`, or a pipeline failure (closed connection,
    /// failed re-authentication, unbound capability) folded into `C::Error`.
    pub async fn invoke<T, F, Fut>(&self, op: Operation, call: F) -> Result<T, C::Error>
    where
        T: Send + 'static,
        F: FnOnce(Arc<C>, Arc<SessionContext>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, C::Error>> + Send + 'static,
    {
        self.core.dispatch::<C, T, F, Fut>(op, call).await
    }
}

impl ServiceHandle<dyn LogonService> {
    /// Log on with the connection's properties without touching the
    /// connection's current logon result.
    ///
    /// # Errors
    ///
    /// See [`LogonService::logon`].
    pub async fn logon(&self) -> Result<LogonResult, LogonServiceError> {
        let props = self.core.properties.clone();
        self.invoke(LOGON, move |svc, ctx| async move { svc.logon(&ctx, &props).await })
            .await
    }

    /// # Errors
    ///
    /// See [`LogonService::logoff`].
    pub async fn logoff(&self) -> Result<(), LogonServiceError> {
        self.invoke(LOGOFF, |svc, ctx| async move { svc.logoff(&ctx).await })
            .await
    }

    /// # Errors
    ///
    /// See [`LogonService::ping`].
    pub async fn ping(&self) -> Result<(), LogonServiceError> {
        let ping: BoxFuture<'_, Result<(), LogonServiceError>> = self
            .invoke(PING, |svc, ctx| async move { svc.ping(&ctx).await })
            .boxed();
        ping.await
    }
}

impl ServiceHandle<dyn QueryService> {
    /// # Errors
    ///
    /// See [`QueryService::execute`].
    pub async fn execute(&self, request: QueryRequest) -> Result<RequestAck, QueryServiceError> {
        self.invoke(EXECUTE, move |svc, ctx| async move {
            svc.execute(&ctx, request).await
        })
        .await
    }

    /// Cancel a request. Never re-authenticates, so it can be issued from a
    /// caller whose identity differs from the session's.
    ///
    /// # Errors
    ///
    /// See [`QueryService::cancel_request`].
    pub async fn cancel_request(&self, request_id: i64) -> Result<bool, QueryServiceError> {
        self.invoke(CANCEL_REQUEST, move |svc, ctx| async move {
            svc.cancel_request(&ctx, request_id).await
        })
        .await
    }
}
