use secrecy::SecretString;
use uuid::Uuid;

use crate::constants::ANONYMOUS_NAME;

/// `Principal` is the authenticated identity a caller presents to a session.
///
/// Produced by an authentication backend and associated with the calling context
/// through a [`SecurityHelper`](crate::SecurityHelper). Two principals are equal when
/// they name the same subject in the same security domain; credentials and roles
/// do not take part in equality.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Principal {
    /// Subject ID of the authenticated user or service.
    subject_id: Uuid,
    /// Login name.
    name: String,
    /// Security domain that vouched for this principal, if any.
    security_domain: Option<String>,
    /// Roles granted by the security domain.
    #[serde(default)]
    roles: Vec<String>,
    /// Credential presented at logon. Never serialized/persisted.
    #[serde(skip)]
    credential: Option<SecretString>,
}

impl Principal {
    /// Create a new `Principal` builder
    #[must_use]
    pub fn builder() -> PrincipalBuilder {
        PrincipalBuilder::default()
    }

    /// Create an anonymous principal with no subject, domain, or roles
    #[must_use]
    pub fn anonymous() -> Self {
        PrincipalBuilder::default().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn security_domain(&self) -> Option<&str> {
        self.security_domain.as_deref()
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Get the credential presented at logon.
    #[must_use]
    pub fn credential(&self) -> Option<&SecretString> {
        self.credential.as_ref()
    }

    /// Whether this principal was vouched for by `security_domain`.
    #[must_use]
    pub fn belongs_to(&self, security_domain: &str) -> bool {
        self.security_domain.as_deref() == Some(security_domain)
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.subject_id == other.subject_id
            && self.name == other.name
            && self.security_domain == other.security_domain
    }
}

impl Eq for Principal {}

#[derive(Default)]
pub struct PrincipalBuilder {
    subject_id: Option<Uuid>,
    name: Option<String>,
    security_domain: Option<String>,
    roles: Vec<String>,
    credential: Option<SecretString>,
}

impl PrincipalBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn security_domain(mut self, security_domain: &str) -> Self {
        self.security_domain = Some(security_domain.to_owned());
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: impl Into<SecretString>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Principal {
        Principal {
            subject_id: self.subject_id.unwrap_or_default(),
            name: self.name.unwrap_or_else(|| ANONYMOUS_NAME.to_owned()),
            security_domain: self.security_domain,
            roles: self.roles,
            credential: self.credential,
        }
    }
}
