//! Session-scoped execution context.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use vdb_security::{Principal, SecurityHelper};

use crate::models::{SessionMetadata, SessionToken};

/// Execution context bound to every capability call made through a connection.
///
/// Holds the authenticated session (established by the logon backend), the
/// caller's security context handed to the backend for passthrough logons, and
/// the association mechanism used to compare principals. The owning connection
/// creates it; derived connections borrow it and never close it.
pub struct SessionContext {
    security_helper: Arc<dyn SecurityHelper>,
    use_calling_task: bool,
    session: RwLock<Option<SessionMetadata>>,
    security_context: RwLock<Option<Principal>>,
    closed: AtomicBool,
}

impl SessionContext {
    #[must_use]
    pub fn new(security_helper: Arc<dyn SecurityHelper>, use_calling_task: bool) -> Self {
        Self {
            security_helper,
            use_calling_task,
            session: RwLock::new(None),
            security_context: RwLock::new(None),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn security_helper(&self) -> &Arc<dyn SecurityHelper> {
        &self.security_helper
    }

    /// Whether capability calls run on the caller's task rather than a spawned one.
    #[must_use]
    pub fn use_calling_task(&self) -> bool {
        self.use_calling_task
    }

    /// Bind a freshly authenticated session. Reopens a previously closed context.
    pub fn establish(&self, metadata: SessionMetadata) {
        *self.session.write() = Some(metadata);
        self.closed.store(false, Ordering::Release);
    }

    /// Mark the session as logged off.
    pub fn close_session(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_established(&self) -> bool {
        self.session.read().is_some()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.session_token.session_id().to_owned())
    }

    #[must_use]
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.read().as_ref().map(|s| s.session_token.clone())
    }

    #[must_use]
    pub fn vdb_name(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.vdb_name.clone())
    }

    /// Principal the session was authenticated as.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.session.read().as_ref().and_then(|s| s.principal.clone())
    }

    /// Security domain that authenticated the session, if one is configured.
    #[must_use]
    pub fn security_domain(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .and_then(|s| s.security_domain.clone())
    }

    /// Caller identity the next logon authenticates with.
    #[must_use]
    pub fn security_context(&self) -> Option<Principal> {
        self.security_context.read().clone()
    }

    pub fn set_security_context(&self, principal: Option<Principal>) {
        *self.security_context.write() = principal;
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id())
            .field("security_domain", &self.security_domain())
            .field("use_calling_task", &self.use_calling_task)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
