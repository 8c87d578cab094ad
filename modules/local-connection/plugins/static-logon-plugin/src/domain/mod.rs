//! Domain layer for the static logon plugin.

pub mod logon;
pub mod query;
pub mod registry;
pub mod repository;

pub use logon::StaticLogonService;
pub use query::StaticQueryService;
pub use registry::LocalServiceRegistry;
pub use repository::InMemoryVdbRepository;
