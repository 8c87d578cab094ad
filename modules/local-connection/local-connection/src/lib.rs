//! Local Connection
//!
//! In-process connection to the query engine. A [`LocalConnection`] binds to a
//! [`ClientServiceRegistry`](local_connection_sdk::ClientServiceRegistry)
//! looked up in a [`TransportDirectory`], authenticates a session, and hands out
//! [`ServiceHandle`]s through which every capability call passes the same
//! pre/post-call policy: closed check, identity reconciliation, session-bound
//! execution, and error translation.
//!
//! ```ignore
//! let conn = LocalConnection::open(&directory, props, true).await?;
//! let ack = conn.service::<dyn QueryService>().execute(request).await?;
//! conn.close().await;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod directory;
pub mod domain;
pub mod version;

pub use config::{ConfigError, LocalConnectionConfig};
pub use directory::{TransportDirectory, registry_binding_name};
pub use domain::{ConnectionState, LocalConnection, ServiceHandle};
pub use version::server_version;
