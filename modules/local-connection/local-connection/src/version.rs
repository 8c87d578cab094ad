//! Engine version reported by local connections.

use std::sync::LazyLock;

static SERVER_VERSION: LazyLock<String> = LazyLock::new(|| {
    let version = env!("CARGO_PKG_VERSION");
    tracing::debug!(version, "server version resolved");
    version.to_owned()
});

/// Version of the in-process engine, resolved once per process.
#[must_use]
pub fn server_version() -> &'static str {
    SERVER_VERSION.as_str()
}
