//! Plugin-based backend registry
//!
//! The registry maps backend type names to factories, so binaries can build a
//! [`RemoteLog`] from configuration without hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use remotelog_core::registry::BackendRegistry;
//!
//! let registry = BackendRegistry::with_builtin();
//! remotelog_github::register(&registry);
//!
//! let backend = registry.create_backend(&config.backend)?;
//! ```

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::store::MemoryRemoteLogFactory;
use crate::traits::{RemoteLog, RemoteLogFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Backend registry for plugin-based backend creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct BackendRegistry {
    /// Registered backend factories
    backends: RwLock<HashMap<String, Box<dyn RemoteLogFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the backends shipped in this crate (`memory`)
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_backend("memory", Box::new(MemoryRemoteLogFactory));
        registry
    }

    /// Register a backend factory
    ///
    /// # Parameters
    ///
    /// - `name`: Backend type name (e.g., "github", "memory")
    /// - `factory`: Factory object for creating backend instances
    pub fn register_backend(&self, name: impl Into<String>, factory: Box<dyn RemoteLogFactory>) {
        let name = name.into();
        let mut backends = self
            .backends
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        backends.insert(name, factory);
    }

    /// Create a backend from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn RemoteLog>)`: Created backend instance
    /// - `Err(Error)`: If the backend type is not registered or creation fails
    pub fn create_backend(&self, config: &BackendConfig) -> Result<Arc<dyn RemoteLog>> {
        config.validate()?;

        let backend_type = config.type_name();
        let backends = self
            .backends
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = backends
            .get(backend_type)
            .ok_or_else(|| Error::config(format!("Unknown backend type: {}", backend_type)))?;

        factory.create(config)
    }

    /// List all registered backend types
    pub fn list_backends(&self) -> Vec<String> {
        let backends = self
            .backends
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        backends.keys().cloned().collect()
    }

    /// Check if a backend type is registered
    pub fn has_backend(&self, name: &str) -> bool {
        let backends = self
            .backends
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        backends.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockBackendFactory;

    impl RemoteLogFactory for MockBackendFactory {
        fn create(&self, _config: &BackendConfig) -> Result<Arc<dyn RemoteLog>> {
            Err(Error::backend("mock", "Mock backend not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = BackendRegistry::new();

        assert!(!registry.has_backend("mock"));

        registry.register_backend("mock", Box::new(MockBackendFactory));

        assert!(registry.has_backend("mock"));
        assert!(registry.list_backends().contains(&"mock".to_string()));
    }

    #[test]
    fn test_builtin_memory_backend() {
        let registry = BackendRegistry::with_builtin();
        let backend = registry.create_backend(&BackendConfig::Memory).unwrap();
        assert_eq!(backend.backend_name(), "memory");
    }

    #[test]
    fn test_unknown_backend_type() {
        let registry = BackendRegistry::with_builtin();
        let config = BackendConfig::Github {
            repo: "acme/site".to_string(),
            api_base: None,
            branch: None,
        };
        let err = registry.create_backend(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown backend type: github"));
    }

    #[test]
    fn test_invalid_config_rejected_before_lookup() {
        let registry = BackendRegistry::with_builtin();
        let config = BackendConfig::Custom {
            factory: String::new(),
            config: serde_json::json!({}),
        };
        assert!(registry.create_backend(&config).is_err());
    }
}
