//! Domain layer for local connections.

mod auth;
pub mod connection;
mod dispatch;
pub mod lifecycle;
mod translate;

pub use connection::LocalConnection;
pub use dispatch::ServiceHandle;
pub use lifecycle::ConnectionState;
