//! Capability interfaces reachable through a connection.
//!
//! Capabilities are registered in a [`ServiceHub`](crate::ServiceHub) by the
//! registry that serves them and resolved per call by the connection:
//!
//! ```ignore
//! let query = connection.service::<dyn QueryService>();
//! let ack = query.execute(QueryRequest { request_id: 7, sql }).await?;
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::SessionContext;
use crate::error::{ClientError, FailureContract, LogonServiceError, QueryServiceError};
use crate::models::{ConnectionProperties, LogonResult, QueryRequest, RequestAck};

/// A service interface callable through a connection.
pub trait Capability: Send + Sync + 'static {
    /// Name used in logs and error messages.
    const NAME: &'static str;

    /// Calls on this capability establish identity themselves and are never
    /// preceded by an implicit re-authentication.
    const AUTHENTICATES: bool = false;

    /// Failure contract declared by the capability's operations.
    type Error: FailureContract;
}

/// A single operation of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub capability: &'static str,
    pub name: &'static str,
}

impl Operation {
    #[must_use]
    pub const fn new(capability: &'static str, name: &'static str) -> Self {
        Self { capability, name }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.capability, self.name)
    }
}

pub const LOGON: Operation = Operation::new(<dyn LogonService as Capability>::NAME, "logon");
pub const LOGOFF: Operation = Operation::new(<dyn LogonService as Capability>::NAME, "logoff");
pub const PING: Operation = Operation::new(<dyn LogonService as Capability>::NAME, "ping");
pub const EXECUTE: Operation = Operation::new(<dyn QueryService as Capability>::NAME, "execute");

/// The designated cancel operation. It must act on the session that issued
/// the request, so it is never preceded by an implicit re-authentication.
pub const CANCEL_REQUEST: Operation =
    Operation::new(<dyn QueryService as Capability>::NAME, "cancel_request");

/// Session logon, logoff and liveness.
#[async_trait]
pub trait LogonService: Send + Sync {
    /// Authenticate using `props` and establish the session on `ctx`.
    ///
    /// When the context carries a security context (see
    /// [`SessionContext::security_context`]) and passthrough is requested,
    /// the backend authenticates as that principal instead of the supplied
    /// credentials.
    ///
    /// # Errors
    ///
    /// - `Logon` if the credentials are rejected; the message is shown to users
    /// - `Component` for internal failures
    /// - `Communication` if the engine cannot be reached
    async fn logon(
        &self,
        ctx: &SessionContext,
        props: &ConnectionProperties,
    ) -> Result<LogonResult, LogonServiceError>;

    /// End the session bound to `ctx`. The session's own principal is
    /// [`SessionContext::principal`]; the caller's association may differ.
    ///
    /// # Errors
    ///
    /// Backend failures; callers generally ignore them.
    async fn logoff(&self, ctx: &SessionContext) -> Result<(), LogonServiceError>;

    /// Check that the session bound to `ctx` is alive.
    ///
    /// # Errors
    ///
    /// Any error means the session is not usable.
    async fn ping(&self, ctx: &SessionContext) -> Result<(), LogonServiceError>;
}

impl Capability for dyn LogonService {
    const NAME: &'static str = "LogonService";
    const AUTHENTICATES: bool = true;
    type Error = LogonServiceError;
}

/// Query submission and cancellation.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a request for processing.
    ///
    /// # Errors
    ///
    /// - `Processing` if the engine rejects the request
    /// - `Component` for internal failures
    /// - `Communication` if the engine cannot be reached
    async fn execute(
        &self,
        ctx: &SessionContext,
        request: QueryRequest,
    ) -> Result<RequestAck, QueryServiceError>;

    /// Cancel a request previously submitted on this session.
    ///
    /// Returns `false` if the request was unknown or already finished.
    ///
    /// # Errors
    ///
    /// Same as [`QueryService::execute`].
    async fn cancel_request(
        &self,
        ctx: &SessionContext,
        request_id: i64,
    ) -> Result<bool, QueryServiceError>;
}

impl Capability for dyn QueryService {
    const NAME: &'static str = "QueryService";
    type Error = QueryServiceError;
}

/// A client's session with the engine.
#[async_trait]
pub trait ServerConnection: Send + Sync {
    /// Whether the connection is open and its session answers a ping within
    /// `timeout`. Never fails; any error yields `false`.
    async fn is_open(&self, timeout: Duration) -> bool;

    /// Close the connection. Idempotent.
    async fn close(&self);

    /// Result of the most recent successful logon.
    fn logon_result(&self) -> Option<Arc<LogonResult>>;

    /// Whether `other` talks to the same engine instance.
    ///
    /// # Errors
    ///
    /// `Communication` if the instance of either side cannot be determined.
    fn is_same_instance(&self, other: &dyn ServerConnection) -> Result<bool, ClientError>;

    fn supports_continuous(&self) -> bool;

    /// Whether the engine runs in this process.
    fn is_local(&self) -> bool;

    fn server_version(&self) -> &str;

    /// Release per-call resources held on behalf of the caller.
    fn clean_up(&self);

    fn as_any(&self) -> &dyn Any;
}
