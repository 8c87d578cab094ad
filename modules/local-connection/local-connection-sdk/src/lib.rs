//! Local Connection SDK
//!
//! This crate provides the public API shared by local connections and the
//! services they dispatch to:
//!
//! - [`LogonService`], [`QueryService`] - Capability traits served by a registry
//! - [`ServerConnection`] - Client-facing connection trait
//! - [`ClientServiceRegistry`] - Registry contract a connection binds to
//! - [`SessionContext`] - Session state handed to every capability call
//! - [`properties`] - Connection property keys read by connections and backends
//! - [`ClientError`] and per-capability failure contracts
//!
//! ## Usage
//!
//! Registries publish capability implementations in their [`ServiceHub`]:
//!
//! ```ignore
//! use local_connection_sdk::{LogonService, ServiceHub};
//!
//! let hub = ServiceHub::new();
//! hub.register::<dyn LogonService>(Arc::new(MyLogon::default()));
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod hub;
pub mod models;
pub mod properties;
pub mod registry;

// Re-export main types at crate root
pub use api::{
    CANCEL_REQUEST, Capability, EXECUTE, LOGOFF, LOGON, LogonService, Operation, PING,
    QueryService, ServerConnection,
};
pub use context::SessionContext;
pub use error::{
    BoxError, ClientError, CommunicationError, ComponentError, ComponentErrorKind,
    ConnectionError, FailureContract, LogonError, LogonServiceError, QueryServiceError,
};
pub use hub::{ServiceHub, ServiceHubError};
pub use models::{
    ConnectionProperties, LogonResult, QueryRequest, RequestAck, SessionMetadata, SessionToken,
    VdbKey,
};
pub use registry::{ClientServiceRegistry, VdbLifecycleListener, VdbRepository};
