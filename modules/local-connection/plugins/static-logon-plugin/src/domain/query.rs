//! Request bookkeeping for the static registry.

use std::collections::HashMap;

use async_trait::async_trait;
use local_connection_sdk::{
    ComponentError, QueryRequest, QueryService, QueryServiceError, RequestAck, SessionContext,
};
use parking_lot::Mutex;

/// Query service that accepts requests without executing them.
///
/// Submitted requests stay pending until cancelled; useful for exercising
/// session handling without an engine.
#[derive(Default)]
pub struct StaticQueryService {
    /// request id -> owning session id
    pending: Mutex<HashMap<i64, String>>,
}

impl StaticQueryService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }
}

fn active_session(ctx: &SessionContext) -> Result<String, QueryServiceError> {
    match ctx.session_id() {
        Some(id) if !ctx.is_closed() => Ok(id),
        _ => Err(ComponentError::internal("no active session").into()),
    }
}

#[async_trait]
impl QueryService for StaticQueryService {
    async fn execute(
        &self,
        ctx: &SessionContext,
        request: QueryRequest,
    ) -> Result<RequestAck, QueryServiceError> {
        let session_id = active_session(ctx)?;
        if request.sql.trim().is_empty() {
            return Err(QueryServiceError::Processing("empty statement".to_owned()));
        }

        self.pending
            .lock()
            .insert(request.request_id, session_id.clone());
        tracing::debug!(session_id = %session_id, request_id = request.request_id, "request accepted");

        Ok(RequestAck {
            request_id: request.request_id,
            session_id,
        })
    }

    async fn cancel_request(
        &self,
        ctx: &SessionContext,
        request_id: i64,
    ) -> Result<bool, QueryServiceError> {
        let session_id = active_session(ctx)?;
        let mut pending = self.pending.lock();
        if pending.get(&request_id) == Some(&session_id) {
            pending.remove(&request_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
