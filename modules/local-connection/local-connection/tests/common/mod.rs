#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Mock collaborators shared by the integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use local_connection::TransportDirectory;
use local_connection_sdk::{
    ClientError, ClientServiceRegistry, CommunicationError, ComponentError, ConnectionError,
    ConnectionProperties, LogonError, LogonResult, LogonService, LogonServiceError, QueryRequest,
    QueryService, QueryServiceError, RequestAck, ServiceHub, SessionContext, SessionMetadata,
    SessionToken, VdbKey, VdbLifecycleListener, VdbRepository,
};
use parking_lot::Mutex;
use vdb_security::{LocalSecurityHelper, Principal, SecurityHelper};

pub const DOMAIN: &str = "corp";
pub const VDB: &str = "sales";

pub fn principal(name: &str) -> Principal {
    Principal::builder().name(name).security_domain(DOMAIN).build()
}

pub fn request(id: i64) -> QueryRequest {
    QueryRequest {
        request_id: id,
        sql: "SELECT 1".to_owned(),
    }
}

/// How the mock logon backend answers.
#[derive(Debug, Clone)]
pub enum LogonBehavior {
    Accept,
    Reject(String),
    Unreachable(String),
    Broken(String),
}

/// Logon backend counting calls.
///
/// Establishes sessions as the caller identity handed over on the session
/// context, like a passthrough-capable backend.
pub struct MockLogon {
    domain: Option<String>,
    behavior: Mutex<LogonBehavior>,
    pub logons: AtomicUsize,
    pub logoffs: AtomicUsize,
    pub pings: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    logon_delay_ms: AtomicU64,
    logoff_delay_ms: AtomicU64,
    /// Principal recorded on the session at the last logoff.
    pub last_logoff_principal: Mutex<Option<String>>,
    stall_logoff: AtomicBool,
    stall_ping: AtomicBool,
}

impl MockLogon {
    fn new(domain: Option<&str>) -> Self {
        Self {
            domain: domain.map(str::to_owned),
            behavior: Mutex::new(LogonBehavior::Accept),
            logons: AtomicUsize::new(0),
            logoffs: AtomicUsize::new(0),
            pings: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            logon_delay_ms: AtomicU64::new(0),
            logoff_delay_ms: AtomicU64::new(0),
            last_logoff_principal: Mutex::new(None),
            stall_logoff: AtomicBool::new(false),
            stall_ping: AtomicBool::new(false),
        }
    }

    pub fn set_behavior(&self, behavior: LogonBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn set_logon_delay(&self, delay: Duration) {
        self.logon_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
    }

    pub fn set_logoff_delay(&self, delay: Duration) {
        self.logoff_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
    }

    pub fn stall_logoff(&self) {
        self.stall_logoff.store(true, Ordering::SeqCst);
    }

    pub fn stall_ping(&self) {
        self.stall_ping.store(true, Ordering::SeqCst);
    }

    pub fn logons(&self) -> usize {
        self.logons.load(Ordering::SeqCst)
    }

    pub fn logoffs(&self) -> usize {
        self.logoffs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogonService for MockLogon {
    async fn logon(
        &self,
        ctx: &SessionContext,
        _props: &ConnectionProperties,
    ) -> Result<LogonResult, LogonServiceError> {
        let n = self.logons.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.logon_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let behavior = self.behavior.lock().clone();
        match behavior {
            LogonBehavior::Accept => {}
            LogonBehavior::Reject(msg) => return Err(LogonError::new(msg).into()),
            LogonBehavior::Unreachable(msg) => {
                return Err(ComponentError::internal("logon failed")
                    .with_source(CommunicationError::new(msg))
                    .into());
            }
            LogonBehavior::Broken(msg) => return Err(ComponentError::internal(msg).into()),
        }

        let principal = ctx.security_context();
        let username = principal
            .as_ref()
            .map_or_else(|| "anonymous".to_owned(), |p| p.name().to_owned());
        let session_token = SessionToken::new(format!("session-{n}"), username);
        ctx.establish(SessionMetadata {
            session_token: session_token.clone(),
            vdb_name: VDB.to_owned(),
            vdb_version: None,
            principal,
            security_domain: self.domain.clone(),
        });

        Ok(LogonResult {
            session_token,
            vdb_name: VDB.to_owned(),
            vdb_version: None,
            payload: None,
        })
    }

    async fn logoff(&self, ctx: &SessionContext) -> Result<(), LogonServiceError> {
        self.logoffs.fetch_add(1, Ordering::SeqCst);
        *self.last_logoff_principal.lock() = ctx.principal().map(|p| p.name().to_owned());
        if self.stall_logoff.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let delay = self.logoff_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        ctx.close_session();
        Ok(())
    }

    async fn ping(&self, ctx: &SessionContext) -> Result<(), LogonServiceError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.stall_ping.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if ctx.is_closed() {
            return Err(ComponentError::internal("session is closed").into());
        }
        Ok(())
    }
}

/// Query backend counting calls.
#[derive(Default)]
pub struct MockQuery {
    pub executes: AtomicUsize,
    pub cancels: AtomicUsize,
    /// Session id observed by the last call.
    pub last_session: Mutex<Option<String>>,
}

impl MockQuery {
    pub fn executes(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryService for MockQuery {
    async fn execute(
        &self,
        ctx: &SessionContext,
        request: QueryRequest,
    ) -> Result<RequestAck, QueryServiceError> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        assert!(request.sql != "PANIC", "engine exploded");
        if request.sql.is_empty() {
            return Err(QueryServiceError::Processing("empty statement".to_owned()));
        }
        let session_id = ctx.session_id().unwrap_or_default();
        *self.last_session.lock() = Some(session_id.clone());
        Ok(RequestAck {
            request_id: request.request_id,
            session_id,
        })
    }

    async fn cancel_request(
        &self,
        ctx: &SessionContext,
        _request_id: i64,
    ) -> Result<bool, QueryServiceError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        *self.last_session.lock() = ctx.session_id();
        Ok(true)
    }
}

/// VDB repository recording listener registrations.
#[derive(Default)]
pub struct MockRepository {
    pub listeners: Mutex<Vec<Arc<dyn VdbLifecycleListener>>>,
}

impl VdbRepository for MockRepository {
    fn add_listener(&self, listener: Arc<dyn VdbLifecycleListener>) {
        self.listeners.lock().push(listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn VdbLifecycleListener>) {
        self.listeners.lock().retain(|l| !Arc::ptr_eq(l, listener));
    }
}

pub struct MockRegistry {
    hub: ServiceHub,
    pub helper: Arc<LocalSecurityHelper>,
    pub repository: Option<Arc<MockRepository>>,
    pub waits: AtomicUsize,
    pub vdb_ready: AtomicBool,
}

#[async_trait]
impl ClientServiceRegistry for MockRegistry {
    fn services(&self) -> &ServiceHub {
        &self.hub
    }

    fn security_helper(&self) -> Arc<dyn SecurityHelper> {
        self.helper.clone()
    }

    async fn wait_for_finished(&self, vdb: &VdbKey, _timeout: Duration) -> Result<(), ClientError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        if self.vdb_ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConnectionError::new(format!("VDB {vdb} is not yet deployed or is not active")).into())
        }
    }

    fn vdb_repository(&self) -> Option<Arc<dyn VdbRepository>> {
        self.repository
            .clone()
            .map(|r| r as Arc<dyn VdbRepository>)
    }
}

/// A transport directory with one mock registry bound as "local".
pub struct Fixture {
    pub directory: TransportDirectory,
    pub registry: Arc<MockRegistry>,
    pub logon: Arc<MockLogon>,
    pub query: Arc<MockQuery>,
}

impl Fixture {
    /// Sessions authenticated within the `corp` security domain.
    pub fn new() -> Self {
        Self::build(Some(DOMAIN), true)
    }

    /// Sessions carry no security domain; the registry has no VDB repository.
    pub fn without_domain() -> Self {
        Self::build(None, false)
    }

    fn build(domain: Option<&str>, with_repository: bool) -> Self {
        let logon = Arc::new(MockLogon::new(domain));
        let query = Arc::new(MockQuery::default());

        let hub = ServiceHub::new();
        hub.register::<dyn LogonService>(logon.clone());
        hub.register::<dyn QueryService>(query.clone());

        let registry = Arc::new(MockRegistry {
            hub,
            helper: Arc::new(LocalSecurityHelper::with_principal(principal("alice"))),
            repository: with_repository.then(|| Arc::new(MockRepository::default())),
            waits: AtomicUsize::new(0),
            vdb_ready: AtomicBool::new(true),
        });

        let directory = TransportDirectory::new();
        directory.bind("local", registry.clone());

        Self {
            directory,
            registry,
            logon,
            query,
        }
    }

    pub fn props(&self) -> ConnectionProperties {
        ConnectionProperties::new().with("VirtualDatabaseName", VDB)
    }

    pub fn passthrough_props(&self) -> ConnectionProperties {
        self.props().with("PassthroughAuthentication", "true")
    }

    /// Change the identity the calling context is associated with.
    pub fn associate(&self, name: &str) {
        self.registry.helper.associate(Some(principal(name)));
    }
}
