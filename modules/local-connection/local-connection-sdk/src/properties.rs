//! Well-known [`ConnectionProperties`](crate::ConnectionProperties) keys.
//!
//! Shared by connections and logon backends so both sides read the same keys.

/// Selects the registry the connection binds to.
pub const TRANSPORT_NAME: &str = "TransportName";
pub const VIRTUAL_DATABASE_NAME: &str = "VirtualDatabaseName";
pub const VIRTUAL_DATABASE_VERSION: &str = "VirtualDatabaseVersion";
/// Ready-wait bound in seconds. Negative means unset; takes precedence over
/// [`WAIT_FOR_LOAD`] otherwise.
pub const LOGIN_TIMEOUT: &str = "loginTimeout";
/// Ready-wait bound in milliseconds.
pub const WAIT_FOR_LOAD: &str = "waitForLoad";
pub const PASSTHROUGH_AUTHENTICATION: &str = "PassthroughAuthentication";
/// User name presented to the logon backend.
pub const USER_NAME: &str = "user";
pub const PASSWORD: &str = "password";
