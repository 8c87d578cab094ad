//! Static logon backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use local_connection_sdk::properties::{
    PASSWORD, USER_NAME, VIRTUAL_DATABASE_NAME, VIRTUAL_DATABASE_VERSION,
};
use local_connection_sdk::{
    ComponentError, ConnectionProperties, LogonError, LogonResult, LogonService, LogonServiceError,
    SessionContext, SessionMetadata, SessionToken,
};
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use vdb_security::Principal;
use vdb_security::constants::ANONYMOUS_NAME;

use crate::config::{LogonMode, StaticLogonPluginConfig, UserConfig};

/// Logon backend authenticating against a static user table.
///
/// When the session context carries a caller identity vouched for by the
/// configured security domain, that identity is trusted and no password is
/// checked (passthrough).
pub struct StaticLogonService {
    mode: LogonMode,
    security_domain: Option<String>,
    users: HashMap<String, UserConfig>,
    next_session: AtomicU64,
    active: Mutex<HashSet<String>>,
}

impl StaticLogonService {
    #[must_use]
    pub fn from_config(cfg: &StaticLogonPluginConfig) -> Self {
        if cfg.mode == LogonMode::AcceptAll {
            tracing::warn!("static logon plugin accepts any credentials (accept_all mode)");
        }

        Self {
            mode: cfg.mode,
            security_domain: cfg.security_domain.clone(),
            users: cfg
                .users
                .iter()
                .map(|u| (u.name.clone(), u.clone()))
                .collect(),
            next_session: AtomicU64::new(1),
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Number of sessions currently logged on.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.active.lock().len()
    }

    fn passthrough_principal(&self, ctx: &SessionContext) -> Option<Principal> {
        let domain = self.security_domain.as_deref()?;
        ctx.security_context().filter(|p| p.belongs_to(domain))
    }

    fn check_credentials(&self, props: &ConnectionProperties) -> Result<Principal, LogonError> {
        let name = props.get(USER_NAME).unwrap_or(ANONYMOUS_NAME);
        let rejected = || LogonError::new(format!("User '{name}' could not be authenticated"));

        let roles = match self.mode {
            LogonMode::AcceptAll => Vec::new(),
            LogonMode::StaticUsers => {
                let user = self.users.get(name).ok_or_else(rejected)?;
                let supplied = props.get(PASSWORD).unwrap_or_default();
                if user.password.expose_secret() != supplied {
                    return Err(rejected());
                }
                user.roles.clone()
            }
        };

        let mut builder = Principal::builder().name(name).roles(roles);
        if let Some(domain) = &self.security_domain {
            builder = builder.security_domain(domain);
        }
        if let Some(password) = props.get(PASSWORD) {
            builder = builder.credential(password.to_owned());
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl LogonService for StaticLogonService {
    #[tracing::instrument(skip_all)]
    async fn logon(
        &self,
        ctx: &SessionContext,
        props: &ConnectionProperties,
    ) -> Result<LogonResult, LogonServiceError> {
        let Some(vdb_name) = props.get(VIRTUAL_DATABASE_NAME) else {
            return Err(LogonError::new("no virtual database name was specified").into());
        };
        let vdb_version = props.get(VIRTUAL_DATABASE_VERSION).map(str::to_owned);

        let principal = match self.passthrough_principal(ctx) {
            Some(principal) => principal,
            None => self.check_credentials(props)?,
        };

        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed).to_string();
        let session_token = SessionToken::new(session_id.clone(), principal.name());

        ctx.establish(SessionMetadata {
            session_token: session_token.clone(),
            vdb_name: vdb_name.to_owned(),
            vdb_version: vdb_version.clone(),
            principal: Some(principal),
            security_domain: self.security_domain.clone(),
        });
        self.active.lock().insert(session_id.clone());

        tracing::debug!(session_id = %session_id, vdb = vdb_name, "logon accepted");
        Ok(LogonResult {
            session_token,
            vdb_name: vdb_name.to_owned(),
            vdb_version,
            payload: None,
        })
    }

    async fn logoff(&self, ctx: &SessionContext) -> Result<(), LogonServiceError> {
        if let Some(session_id) = ctx.session_id() {
            self.active.lock().remove(&session_id);
        }
        ctx.close_session();
        Ok(())
    }

    async fn ping(&self, ctx: &SessionContext) -> Result<(), LogonServiceError> {
        let alive = !ctx.is_closed()
            && ctx
                .session_id()
                .is_some_and(|id| self.active.lock().contains(&id));
        if alive {
            Ok(())
        } else {
            Err(ComponentError::internal("session is not active").into())
        }
    }
}
