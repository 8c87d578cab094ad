//! Domain models shared between connections and their collaborators.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vdb_security::Principal;

use crate::context::SessionContext;

/// Identifies an established session on the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken {
    session_id: String,
    username: String,
}

impl SessionToken {
    pub fn new(session_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            username: username.into(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Result of a successful logon.
///
/// Immutable once produced; re-authentication replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogonResult {
    pub session_token: SessionToken,
    /// Virtual database the session is bound to.
    pub vdb_name: String,
    pub vdb_version: Option<String>,
    /// Backend-specific extras returned with the logon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl LogonResult {
    #[must_use]
    pub fn session_id(&self) -> &str {
        self.session_token.session_id()
    }
}

/// Name and optional version of a virtual database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VdbKey {
    name: String,
    version: Option<String>,
}

impl VdbKey {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// `true` when no exact version is named, i.e. the key matches the latest
    /// deployed version at most.
    #[must_use]
    pub fn is_at_most(&self) -> bool {
        self.version.is_none()
    }
}

impl fmt::Display for VdbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}.{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Session data the logon backend establishes on a [`SessionContext`].
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub session_token: SessionToken,
    pub vdb_name: String,
    pub vdb_version: Option<String>,
    /// Principal the session was authenticated as; `None` for unauthenticated sessions.
    pub principal: Option<Principal>,
    /// Security domain that authenticated the session; `None` when none is configured.
    pub security_domain: Option<String>,
}

/// Connection options.
///
/// String key/value pairs as supplied by the client, plus an optional
/// externally supplied [`SessionContext`] which makes the connection derived.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionProperties {
    values: BTreeMap<String, String>,
    #[serde(skip)]
    session_context: Option<Arc<SessionContext>>,
}

impl ConnectionProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_owned(), value.into());
        self
    }

    /// Borrow an existing session instead of establishing a new one.
    #[must_use]
    pub fn with_session_context(mut self, ctx: Arc<SessionContext>) -> Self {
        self.session_context = Some(ctx);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_owned(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn session_context(&self) -> Option<&Arc<SessionContext>> {
        self.session_context.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Debug for ConnectionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may hold passwords.
        f.debug_struct("ConnectionProperties")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("derived", &self.session_context.is_some())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            session_context: None,
        }
    }
}

/// A request submitted to the query capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub request_id: i64,
    pub sql: String,
}

/// Acknowledgement that a request was accepted for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAck {
    pub request_id: i64,
    pub session_id: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn vdb_key_without_version_is_at_most() {
        assert!(VdbKey::new("sales", None).is_at_most());
        assert!(!VdbKey::new("sales", Some("2".to_owned())).is_at_most());
        assert_eq!(VdbKey::new("sales", Some("2".to_owned())).to_string(), "sales.2");
    }

    #[test]
    fn properties_debug_hides_values() {
        let props = ConnectionProperties::new().with("password", "hunter2");

        let rendered = format!("{props:?}");
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn properties_deserialize_from_map() {
        let props: ConnectionProperties =
            serde_json::from_str(r#"{"VirtualDatabaseName":"sales","user":"alice"}"#).unwrap();

        assert_eq!(props.get("VirtualDatabaseName"), Some("sales"));
        assert_eq!(props.get("user"), Some("alice"));
        assert!(props.session_context().is_none());
    }
}
