//! Caller-identity association.
//!
//! A [`SecurityHelper`] tracks which [`Principal`] the calling context currently
//! acts as. Connections only read it, to detect identity drift; the association
//! itself belongs to the caller.

use parking_lot::RwLock;

use crate::principal::Principal;

/// Security-association mechanism consumed by connections.
///
/// Implementations decide where the association lives (per request, per task,
/// per process). Equality between principals is domain-defined and can be
/// overridden through [`SecurityHelper::same_principal`].
pub trait SecurityHelper: Send + Sync {
    /// Associates `principal` with the calling context.
    ///
    /// Returns the principal that was associated before the call.
    fn associate(&self, principal: Option<Principal>) -> Option<Principal>;

    /// The principal currently associated, if any.
    fn current_principal(&self) -> Option<Principal>;

    /// The currently associated principal as seen by `security_domain`.
    ///
    /// `None` when nothing is associated or the association was not vouched for
    /// by that domain.
    fn principal_for(&self, security_domain: &str) -> Option<Principal>;

    /// Domain-defined equality used when reconciling session identity.
    fn same_principal(&self, a: &Principal, b: &Principal) -> bool {
        a == b
    }
}

/// In-process [`SecurityHelper`] holding a single association slot.
///
/// Suitable for embedded deployments where one caller identity is active at a
/// time, and for tests that simulate identity drift.
#[derive(Default)]
pub struct LocalSecurityHelper {
    current: RwLock<Option<Principal>>,
}

impl LocalSecurityHelper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_principal(principal: Principal) -> Self {
        Self {
            current: RwLock::new(Some(principal)),
        }
    }
}

impl SecurityHelper for LocalSecurityHelper {
    fn associate(&self, principal: Option<Principal>) -> Option<Principal> {
        std::mem::replace(&mut *self.current.write(), principal)
    }

    fn current_principal(&self) -> Option<Principal> {
        self.current.read().clone()
    }

    fn principal_for(&self, security_domain: &str) -> Option<Principal> {
        self.current
            .read()
            .as_ref()
            .filter(|p| p.belongs_to(security_domain))
            .cloned()
    }
}
