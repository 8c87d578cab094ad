#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Logon Plugin
//!
//! In-process client service registry for development and testing. Serves a
//! logon backend backed by a static user table, a query service that only
//! tracks requests, and an in-memory VDB repository.
//!
//! ## Modes
//!
//! - **`accept_all`** (default): Accepts any user name and password.
//!
//! - **`static_users`**: Accepts only configured users with matching passwords.
//!
//! In both modes, a caller identity vouched for by the configured security
//! domain is trusted without a password (passthrough).
//!
//! ## Configuration
//!
//! ```yaml
//! static_logon_plugin:
//!   mode: static_users
//!   security_domain: "corp"
//!   users:
//!     - name: "alice"
//!       password: "s3cret"
//!       roles: ["analyst"]
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let registry = LocalServiceRegistry::from_config(&cfg, helper);
//! directory.bind("local", Arc::new(registry));
//! ```

pub mod config;
pub mod domain;

pub use config::{LogonMode, StaticLogonPluginConfig, UserConfig};
pub use domain::{InMemoryVdbRepository, LocalServiceRegistry, StaticLogonService, StaticQueryService};
