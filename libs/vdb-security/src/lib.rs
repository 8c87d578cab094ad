#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod association;
pub mod constants;
pub mod principal;

pub use association::{LocalSecurityHelper, SecurityHelper};
pub use principal::{Principal, PrincipalBuilder};
