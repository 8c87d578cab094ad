//! Translation of call failures into a capability's declared contract.

use std::any::Any;

use local_connection_sdk::{ClientError, ComponentError, FailureContract};
use tokio::task::JoinError;

/// A failure observed while dispatching a capability call.
#[derive(Debug)]
pub enum Failure<E> {
    /// Raised by the capability itself; already in its declared shape.
    Declared(E),
    /// Raised by the dispatch pipeline (closed connection, re-authentication,
    /// missing binding).
    Undeclared(ClientError),
    /// The spawned task running the call did not complete.
    Envelope(JoinError),
}

/// Fold `failure` into the declared contract `E`.
///
/// Declared failures pass through unchanged, so translating twice never
/// double-wraps.
pub fn translate<E: FailureContract>(failure: Failure<E>) -> E {
    match failure {
        Failure::Declared(e) => e,
        Failure::Undeclared(e) => E::from_failure(e),
        Failure::Envelope(e) => E::from_failure(unwrap_envelope(e).into()),
    }
}

fn unwrap_envelope(e: JoinError) -> ComponentError {
    if e.is_panic() {
        let payload = e.into_panic();
        ComponentError::internal(format!("capability call panicked: {}", panic_message(&*payload)))
    } else {
        ComponentError::internal("capability call was cancelled").with_source(e)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
