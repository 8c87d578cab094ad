//! Session authentication and identity reconciliation.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use futures::FutureExt;
use futures::future::BoxFuture;
use local_connection_sdk::{
    ClientError, CommunicationError, ComponentError, ConnectionError, LOGOFF, LOGON, LogonResult,
    LogonService, LogonServiceError,
};
use tokio::sync::Mutex;
use tracing::Instrument;
use vdb_security::{Principal, SecurityHelper};

use super::dispatch::ConnectionCore;

/// Bound on waiting for a logoff acknowledgment.
pub const LOGOFF_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-flight authentication state of a connection.
#[derive(Default)]
pub struct AuthenticationCoordinator {
    /// Held for a whole logoff/logon sequence.
    lock: Mutex<()>,
    current: ArcSwapOption<LogonResult>,
}

impl AuthenticationCoordinator {
    pub fn current(&self) -> Option<Arc<LogonResult>> {
        self.current.load_full()
    }

    pub fn replace(&self, result: LogonResult) {
        self.current.store(Some(Arc::new(result)));
    }
}

/// Principal equality for re-authentication: two absent principals are the
/// same (unauthenticated), one absent principal differs from a present one.
pub fn same_subject(
    helper: &dyn SecurityHelper,
    a: Option<&Principal>,
    b: Option<&Principal>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => helper.same_principal(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl ConnectionCore {
    /// Log off any prior session and log on again with the connection's
    /// properties. At most one sequence runs at a time per connection.
    ///
    /// # Errors
    ///
    /// - `Connection` if the backend rejects the logon (message verbatim)
    /// - `Communication` for any other backend failure
    #[tracing::instrument(skip_all, fields(transport = %self.transport))]
    pub async fn authenticate(self: &Arc<Self>) -> Result<(), ClientError> {
        self.run_sequence(false).await
    }

    /// Run a logoff/logon sequence on its own task under the authentication
    /// lock. Dropping the caller detaches the task; the sequence still
    /// completes, so the session is never left logged off.
    ///
    /// With `only_on_drift`, the sequence is skipped unless the caller's
    /// identity still differs from the session's once the lock is held.
    async fn run_sequence(self: &Arc<Self>, only_on_drift: bool) -> Result<(), ClientError> {
        let core = Arc::clone(self);
        let sequence = tokio::spawn(
            async move {
                let _guard = core.auth.lock.lock().await;
                if only_on_drift {
                    if !core.needs_reauthentication() {
                        return Ok(());
                    }
                    tracing::info!(
                        session_id = ?core.session.session_id(),
                        "implicit identity change, re-authenticating session"
                    );
                }
                core.authenticate_locked().await
            }
            .in_current_span(),
        );

        match sequence.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ComponentError::internal("authentication task failed")
                .with_source(e)
                .into()),
        }
    }

    async fn authenticate_locked(self: &Arc<Self>) -> Result<(), ClientError> {
        // The backend logs off the principal recorded on the session itself;
        // the caller's association is only read.
        let caller = self.session.security_helper().current_principal();
        if self.session.is_established() && !self.session.is_closed() {
            self.logoff().await;
        }
        self.session.set_security_context(caller);

        let props = self.properties.clone();
        let logon: BoxFuture<'_, Result<LogonResult, LogonServiceError>> = self
            .dispatch::<dyn LogonService, _, _, _>(LOGON, move |svc, ctx| async move {
                svc.logon(&ctx, &props).await
            })
            .boxed();
        let result = logon
            .await
            .map_err(logon_failure)?;

        tracing::info!(
            session_id = %result.session_id(),
            vdb = %result.vdb_name,
            "session authenticated"
        );
        self.auth.replace(result);
        Ok(())
    }

    /// Whether the caller's identity drifted from the session's.
    pub fn needs_reauthentication(&self) -> bool {
        if self.session.is_closed() {
            return false;
        }
        let Some(domain) = self.session.security_domain() else {
            return false;
        };
        let helper = self.session.security_helper();
        let current = helper.principal_for(&domain);
        let remembered = self.session.principal();
        !same_subject(helper.as_ref(), current.as_ref(), remembered.as_ref())
    }

    /// Re-authenticate if the caller's identity drifted.
    ///
    /// Drift is re-checked under the authentication lock, so concurrent callers
    /// observing the same drift produce a single logon.
    pub fn reconcile_identity(self: &Arc<Self>) -> BoxFuture<'_, Result<(), ClientError>> {
        async move {
            if !self.needs_reauthentication() {
                return Ok(());
            }
            self.run_sequence(true).await
        }
        .boxed()
    }

    /// Best-effort logoff bounded by [`LOGOFF_TIMEOUT`]; failures are logged
    /// and discarded. Derived connections never log off.
    pub async fn logoff(self: &Arc<Self>) {
        if self.derived {
            return;
        }

        let logoff: BoxFuture<'_, Result<(), LogonServiceError>> = self
            .dispatch::<dyn LogonService, _, _, _>(LOGOFF, |svc, ctx| async move {
                svc.logoff(&ctx).await
            })
            .boxed();
        match tokio::time::timeout(LOGOFF_TIMEOUT, logoff).await {
            Ok(Ok(())) => {
                tracing::debug!(session_id = ?self.session.session_id(), "session logged off");
            }
            Ok(Err(e)) => tracing::debug!(error = %e, "logoff failed, ignoring"),
            Err(_) => tracing::debug!(
                timeout_secs = LOGOFF_TIMEOUT.as_secs(),
                "logoff not acknowledged in time, ignoring"
            ),
        }
    }
}

fn logon_failure(e: LogonServiceError) -> ClientError {
    match e {
        LogonServiceError::Logon(e) => ConnectionError::from_logon(e).into(),
        LogonServiceError::Component(e) => match e.into_communication() {
            Ok(cause) => cause.into(),
            Err(e) => CommunicationError::with_source(e.message().to_owned(), e).into(),
        },
        LogonServiceError::Communication(e) => e.into(),
    }
}
