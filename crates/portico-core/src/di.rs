//! Application service container.
//!
//! Services are registered once, before requests are served, and looked up
//! by type. Dependency parameters reach them through
//! [`ContainerProvider`](crate::ContainerProvider):
//!
//! ```rust
//! use portico_core::di::Container;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let mut container = Container::new();
//! container.insert(Arc::new(Database { url: "postgres://localhost/db".into() }));
//!
//! let db: Arc<Database> = container.get().unwrap();
//! assert_eq!(db.url, "postgres://localhost/db");
//! ```

use crate::error::ApiError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-keyed registry of shared services.
#[derive(Default, Clone)]
pub struct Container {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    names: HashMap<TypeId, &'static str>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service`, replacing any earlier registration of `T`.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        let id = TypeId::of::<T>();
        self.services.insert(id, service);
        self.names.insert(id, std::any::type_name::<T>());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.insert(service);
        self
    }

    /// Looks `T` up.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// Looks `T` up, failing with an internal error if it is missing.
    pub fn require<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ApiError> {
        self.get::<T>().ok_or_else(|| {
            ApiError::internal(format!(
                "service {} is not registered",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Whether `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names.values().copied().collect();
        names.sort_unstable();
        f.debug_struct("Container").field("services", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counter(u32);

    #[test]
    fn test_insert_and_get() {
        let container = Container::new().with(Arc::new(Counter(3)));
        assert!(container.contains::<Counter>());
        assert_eq!(container.get::<Counter>().map(|c| c.0), Some(3));
        assert!(container.get::<String>().is_none());
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_require_missing() {
        let err = Container::new().require::<Counter>().unwrap_err();
        assert!(err.message().contains("Counter"));
    }

    #[test]
    fn test_replace() {
        let mut container = Container::new();
        container.insert(Arc::new(Counter(1)));
        container.insert(Arc::new(Counter(2)));
        assert_eq!(container.len(), 1);
        assert_eq!(container.require::<Counter>().unwrap().0, 2);
    }

    #[test]
    fn test_debug_lists_types() {
        let container = Container::new().with(Arc::new(Counter(0)));
        assert!(format!("{container:?}").contains("Counter"));
    }
}
