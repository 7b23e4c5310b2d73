//! Registry of component providers.

use std::sync::Arc;

use tracing::{debug, info};

use crate::component::Component;
use crate::error::{ComponentError, Result};
use crate::provider::ComponentProvider;

/// Holds the registered providers and lists their components.
#[derive(Default)]
pub struct ComponentRegistry {
    providers: Vec<Arc<dyn ComponentProvider>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Provider ids must be unique.
    pub fn register(&mut self, provider: Arc<dyn ComponentProvider>) -> Result<()> {
        let id = provider.provider_id().to_string();
        if self.provider(&id).is_some() {
            return Err(ComponentError::DuplicateProvider(id));
        }

        info!("Registered component provider: {id}");
        self.providers.push(provider);
        Ok(())
    }

    /// Get a provider by id.
    pub fn provider(&self, provider_id: &str) -> Option<&Arc<dyn ComponentProvider>> {
        self.providers
            .iter()
            .find(|p| p.provider_id() == provider_id)
    }

    /// Ids of all registered providers, in registration order.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_id()).collect()
    }

    /// Components of one provider.
    pub fn provider_components(&self, provider_id: &str) -> Option<Vec<Component>> {
        self.provider(provider_id).map(|p| p.get_components())
    }

    /// Components of all providers, grouped by provider in registration order.
    pub fn get_components(&self) -> Vec<Component> {
        let components: Vec<Component> = self
            .providers
            .iter()
            .flat_map(|p| p.get_components())
            .collect();

        debug!(
            "Listed {} components from {} providers",
            components.len(),
            self.providers.len()
        );
        components
    }
}
