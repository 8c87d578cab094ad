//! Configuration for local connections.
//!
//! Connections are configured with string key/value pairs
//! ([`ConnectionProperties`]); this module parses the recognized keys into a
//! typed [`LocalConnectionConfig`].

use std::time::Duration;

use local_connection_sdk::properties::{
    LOGIN_TIMEOUT, PASSTHROUGH_AUTHENTICATION, TRANSPORT_NAME, VIRTUAL_DATABASE_NAME,
    VIRTUAL_DATABASE_VERSION, WAIT_FOR_LOAD,
};
use local_connection_sdk::{ClientError, ConnectionError, ConnectionProperties, VdbKey};

pub const DEFAULT_TRANSPORT: &str = "local";

/// Malformed connection property.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl From<ConfigError> for ClientError {
    fn from(e: ConfigError) -> Self {
        Self::Connection(ConnectionError::with_source(e.to_string(), e))
    }
}

/// Typed view of the recognized connection properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConnectionConfig {
    pub transport_name: String,
    pub vdb_name: Option<String>,
    pub vdb_version: Option<String>,
    /// Bound on waiting for the target VDB to finish loading; `None` means no wait.
    pub ready_wait: Option<Duration>,
    /// Reconcile the caller's identity before every call.
    pub passthrough: bool,
}

impl Default for LocalConnectionConfig {
    fn default() -> Self {
        Self {
            transport_name: DEFAULT_TRANSPORT.to_owned(),
            vdb_name: None,
            vdb_version: None,
            ready_wait: None,
            passthrough: false,
        }
    }
}

impl LocalConnectionConfig {
    /// Parse the recognized keys of `props`; unrecognized keys are left to the
    /// logon backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a numeric or boolean key cannot
    /// be parsed.
    pub fn from_properties(props: &ConnectionProperties) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // A negative login timeout counts as unset.
        let ready_wait_ms = match parse_i64(props, LOGIN_TIMEOUT)?.filter(|s| *s >= 0) {
            Some(seconds) => Some(seconds.saturating_mul(1000)),
            None => parse_i64(props, WAIT_FOR_LOAD)?,
        };

        Ok(Self {
            transport_name: props
                .get(TRANSPORT_NAME)
                .map_or(defaults.transport_name, str::to_owned),
            vdb_name: props.get(VIRTUAL_DATABASE_NAME).map(str::to_owned),
            vdb_version: props.get(VIRTUAL_DATABASE_VERSION).map(str::to_owned),
            ready_wait: ready_wait_ms
                .and_then(|ms| u64::try_from(ms).ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            passthrough: parse_bool(props, PASSTHROUGH_AUTHENTICATION)?
                .unwrap_or(defaults.passthrough),
        })
    }

    /// The targeted VDB, if a name is configured.
    #[must_use]
    pub fn vdb_key(&self) -> Option<VdbKey> {
        self.vdb_name
            .as_ref()
            .map(|name| VdbKey::new(name.clone(), self.vdb_version.clone()))
    }
}

fn parse_i64(props: &ConnectionProperties, key: &'static str) -> Result<Option<i64>, ConfigError> {
    props
        .get(key)
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw.to_owned(),
                expected: "an integer",
            })
        })
        .transpose()
}

fn parse_bool(props: &ConnectionProperties, key: &'static str) -> Result<Option<bool>, ConfigError> {
    props
        .get(key)
        .map(|raw| match raw.trim() {
            v if v.eq_ignore_ascii_case("true") => Ok(true),
            v if v.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: raw.to_owned(),
                expected: "true or false",
            }),
        })
        .transpose()
}
