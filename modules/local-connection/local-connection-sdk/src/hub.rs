//! Type-keyed service registry.
//!
//! Capability implementations are registered as trait objects and resolved by
//! the trait they implement:
//!
//! ```ignore
//! hub.register::<dyn LogonService>(Arc::new(MyLogon::default()));
//! let logon = hub.get::<dyn LogonService>()?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Errors returned by [`ServiceHub`] lookups.
#[derive(Debug, thiserror::Error)]
pub enum ServiceHubError {
    #[error("no service registered for '{type_name}'")]
    NotFound { type_name: &'static str },
}

/// Registry mapping a service interface to its implementation.
#[derive(Default)]
pub struct ServiceHub {
    services: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ServiceHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the implementation of `T`.
    pub fn register<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .write()
            .insert(TypeId::of::<T>(), Box::new(service));
    }

    /// Resolve the implementation of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceHubError::NotFound`] if nothing is registered for `T`.
    pub fn get<T>(&self) -> Result<Arc<T>, ServiceHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_get::<T>().ok_or(ServiceHubError::NotFound {
            type_name: std::any::type_name::<T>(),
        })
    }

    #[must_use]
    pub fn try_get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Remove the implementation of `T`, returning whether one was registered.
    pub fn unregister<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services.write().remove(&TypeId::of::<T>()).is_some()
    }
}
