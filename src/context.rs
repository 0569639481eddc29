//! Shared application context handed to migrations that ask for it

use crate::parameters::{ParameterStore, Parameters};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Application parameters plus a type-indexed map of shared services
///
/// Built once at startup and passed explicitly as `Arc<ServiceContext>`;
/// there is no process-wide instance.
#[derive(Default)]
pub struct ServiceContext {
    parameters: Parameters,
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceContext {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            services: HashMap::new(),
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Register a service, replacing any previous service of the same type
    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    #[must_use]
    pub fn with_service<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    /// Fetch a shared service by type
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| Arc::clone(service).downcast::<T>().ok())
    }
}

impl ParameterStore for ServiceContext {
    fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.parameter(key)
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("parameters", &self.parameters.len())
            .field("services", &self.services.len())
            .finish()
    }
}
