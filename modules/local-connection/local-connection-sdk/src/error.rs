//! Error types for local connections.
//!
//! [`ClientError`] is the client-facing taxonomy. Each capability additionally
//! declares its own failure contract (e.g. [`LogonServiceError`]); failures that
//! a contract does not declare are folded into it through [`FailureContract`].

use thiserror::Error;

/// Boxed cause carried by wrapping errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Authentication or logon was rejected.
///
/// The message is the backend's original text and is meant for end users.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Surface a backend logon rejection, keeping its message verbatim.
    #[must_use]
    pub fn from_logon(e: LogonError) -> Self {
        Self {
            message: e.message().to_owned(),
            source: Some(Box::new(e)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The backend could not be reached, or failed below the service layer.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommunicationError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CommunicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Classification of a [`ComponentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentErrorKind {
    /// A call was issued after the connection shut down.
    Closed,
    /// The capability has no implementation bound in the registry.
    Unavailable,
    /// Any other failure inside the service.
    Internal,
}

/// Internal failure of the service, unrelated to authentication or transport.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ComponentError {
    kind: ComponentErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ComponentError {
    /// Create the failure reported for calls on a closed connection.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            kind: ComponentErrorKind::Closed,
            message: "connection is closed".to_owned(),
            source: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ComponentErrorKind::Unavailable,
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ComponentErrorKind::Internal,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> ComponentErrorKind {
        self.kind
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.kind == ComponentErrorKind::Closed
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extract the cause if it is a [`CommunicationError`].
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the cause is absent or of another type.
    pub fn into_communication(self) -> Result<CommunicationError, Self> {
        let Self {
            kind,
            message,
            source,
        } = self;
        match source.map(|s| s.downcast::<CommunicationError>()) {
            Some(Ok(cause)) => Ok(*cause),
            Some(Err(other)) => Err(Self {
                kind,
                message,
                source: Some(other),
            }),
            None => Err(Self {
                kind,
                message,
                source: None,
            }),
        }
    }
}

/// Client-facing error taxonomy.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Authentication/logon rejected; the message is the backend's text.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Transport or backend unreachable.
    #[error(transparent)]
    Communication(#[from] CommunicationError),

    /// Internal service failure, including calls on a closed connection.
    #[error(transparent)]
    Component(#[from] ComponentError),
}

impl ClientError {
    /// Whether this is the failure reported for calls on a closed connection.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Component(e) if e.is_closed())
    }
}

/// Authentication-specific rejection raised by a logon backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LogonError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl LogonError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure contract of [`LogonService`](crate::LogonService).
#[derive(Debug, Error)]
pub enum LogonServiceError {
    #[error(transparent)]
    Logon(#[from] LogonError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Communication(#[from] CommunicationError),
}

/// Failure contract of [`QueryService`](crate::QueryService).
#[derive(Debug, Error)]
pub enum QueryServiceError {
    /// The engine rejected or failed to process the request.
    #[error("request processing failed: {0}")]
    Processing(String),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Communication(#[from] CommunicationError),
}

/// Declared failure contract of a capability.
///
/// Dispatching a call may fail for reasons the capability never declares
/// (closed connection, failed re-authentication, missing registry binding).
/// `from_failure` folds such a [`ClientError`] into the most appropriate declared
/// kind, keeping the original reachable through `source()` for diagnostics.
/// Implementations must not re-wrap a failure that already has a declared shape.
pub trait FailureContract: std::error::Error + Send + Sync + Sized + 'static {
    fn from_failure(failure: ClientError) -> Self;
}

impl FailureContract for ClientError {
    fn from_failure(failure: ClientError) -> Self {
        failure
    }
}

impl FailureContract for LogonServiceError {
    fn from_failure(failure: ClientError) -> Self {
        match failure {
            ClientError::Connection(e) => {
                Self::Logon(LogonError::with_source(e.message().to_owned(), e))
            }
            ClientError::Communication(e) => Self::Communication(e),
            ClientError::Component(e) => Self::Component(e),
        }
    }
}

impl FailureContract for QueryServiceError {
    fn from_failure(failure: ClientError) -> Self {
        match failure {
            ClientError::Connection(e) => Self::Component(
                ComponentError::internal("session re-authentication failed").with_source(e),
            ),
            ClientError::Communication(e) => Self::Communication(e),
            ClientError::Component(e) => Self::Component(e),
        }
    }
}

impl From<LogonServiceError> for ClientError {
    fn from(e: LogonServiceError) -> Self {
        match e {
            LogonServiceError::Logon(e) => Self::Connection(ConnectionError::from_logon(e)),
            LogonServiceError::Component(e) => Self::Component(e),
            LogonServiceError::Communication(e) => Self::Communication(e),
        }
    }
}

impl From<QueryServiceError> for ClientError {
    fn from(e: QueryServiceError) -> Self {
        match e {
            QueryServiceError::Processing(msg) => {
                Self::Component(ComponentError::internal(format!("request processing failed: {msg}")))
            }
            QueryServiceError::Component(e) => Self::Component(e),
            QueryServiceError::Communication(e) => Self::Communication(e),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn connection_error_keeps_backend_message() {
        let e = ConnectionError::from_logon(LogonError::new("User 'bob' is locked out"));

        assert_eq!(e.to_string(), "User 'bob' is locked out");
        assert!(e.source().is_some());
    }

    #[test]
    fn component_error_yields_communication_cause() {
        let e = ComponentError::internal("logon failed")
            .with_source(CommunicationError::new("socket reset"));

        let cause = e.into_communication().unwrap();
        assert_eq!(cause.message(), "socket reset");
    }

    #[test]
    fn component_error_without_communication_cause_is_returned() {
        let e = ComponentError::internal("logon failed").with_source(LogonError::new("nope"));

        let back = e.into_communication().unwrap_err();
        assert_eq!(back.message(), "logon failed");
        assert!(back.source().is_some());
    }

    #[test]
    fn client_error_contract_is_identity() {
        let once = ClientError::from_failure(ComponentError::closed().into());
        let twice = ClientError::from_failure(once);

        assert!(twice.is_closed());
        assert!(twice.source().is_none());
    }

    #[test]
    fn logon_contract_does_not_double_wrap() {
        let translated = LogonServiceError::from_failure(ComponentError::closed().into());
        match translated {
            LogonServiceError::Component(e) => assert!(e.is_closed()),
            other => panic!("expected Component, got: {other:?}"),
        }
    }

    #[test]
    fn logon_contract_keeps_connection_cause() {
        let failure = ConnectionError::with_source(
            "password expired",
            CommunicationError::new("socket reset"),
        );

        match LogonServiceError::from_failure(failure.into()) {
            LogonServiceError::Logon(e) => {
                assert_eq!(e.message(), "password expired");
                let cause = e.source().unwrap();
                assert_eq!(cause.to_string(), "password expired");
                assert_eq!(cause.source().unwrap().to_string(), "socket reset");
            }
            other => panic!("expected Logon, got: {other:?}"),
        }
    }

    #[test]
    fn query_contract_wraps_connection_failure_as_component() {
        let translated = QueryServiceError::from_failure(
            ConnectionError::new("password expired").into(),
        );
        match translated {
            QueryServiceError::Component(e) => {
                assert_eq!(e.kind(), ComponentErrorKind::Internal);
                assert_eq!(e.source().unwrap().to_string(), "password expired");
            }
            other => panic!("expected Component, got: {other:?}"),
        }
    }
}
