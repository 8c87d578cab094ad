//! Configuration for the static logon plugin.

use secrecy::SecretString;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticLogonPluginConfig {
    /// Authentication mode.
    pub mode: LogonMode,

    /// Security domain vouching for authenticated principals. When unset,
    /// sessions carry no domain and identity drift is never reconciled.
    pub security_domain: Option<String>,

    /// User table for `static_users` mode.
    pub users: Vec<UserConfig>,
}

impl Default for StaticLogonPluginConfig {
    fn default() -> Self {
        Self {
            mode: LogonMode::AcceptAll,
            security_domain: None,
            users: Vec::new(),
        }
    }
}

/// Authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogonMode {
    /// Accept any user name and password.
    #[default]
    AcceptAll,
    /// Accept only users listed in the user table, with matching passwords.
    StaticUsers,
}

/// A user accepted in `static_users` mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    pub password: SecretString,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn empty_config_accepts_all() {
        let cfg: StaticLogonPluginConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(cfg.mode, LogonMode::AcceptAll);
        assert!(cfg.security_domain.is_none());
        assert!(cfg.users.is_empty());
    }

    #[test]
    fn parses_user_table() {
        let cfg: StaticLogonPluginConfig = serde_json::from_str(
            r#"{
                "mode": "static_users",
                "security_domain": "corp",
                "users": [{ "name": "alice", "password": "s3cret", "roles": ["analyst"] }]
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.mode, LogonMode::StaticUsers);
        assert_eq!(cfg.security_domain.as_deref(), Some("corp"));
        assert_eq!(cfg.users[0].name, "alice");
        assert_eq!(cfg.users[0].password.expose_secret(), "s3cret");
        assert_eq!(cfg.users[0].roles, vec!["analyst".to_owned()]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = serde_json::from_str::<StaticLogonPluginConfig>(r#"{ "vendor": "x" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let cfg: StaticLogonPluginConfig = serde_json::from_str(
            r#"{ "users": [{ "name": "alice", "password": "s3cret" }] }"#,
        )
        .unwrap();

        assert!(!format!("{cfg:?}").contains("s3cret"));
    }
}
