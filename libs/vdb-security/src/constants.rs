//! Well-known identities.

/// Name given to principals authenticated without a user name.
pub const ANONYMOUS_NAME: &str = "anonymous";
