//! The immutable set of resources served by a panel.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::error::SchemaError;

use super::ResourceDefinition;

/// Resources in registration order, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<ResourceDefinition>>,
    by_name: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn builder() -> ResourceRegistryBuilder {
        ResourceRegistryBuilder::default()
    }

    /// Looks up a resource by name.
    pub fn get(&self, name: &str) -> Result<&Arc<ResourceDefinition>, SchemaError> {
        self.by_name
            .get(name)
            .map(|&index| &self.resources[index])
            .ok_or_else(|| SchemaError::UnknownResource {
                name: name.to_string(),
            })
    }

    /// Resources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDefinition>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Collects resource definitions and rejects duplicate names.
#[derive(Debug, Default)]
pub struct ResourceRegistryBuilder {
    registry: ResourceRegistry,
}

impl ResourceRegistryBuilder {
    pub fn register(mut self, resource: ResourceDefinition) -> Result<Self, SchemaError> {
        let name = resource.name().to_string();
        if self.registry.by_name.contains_key(&name) {
            return Err(SchemaError::DuplicateResource { name });
        }
        self.registry
            .by_name
            .insert(name, self.registry.resources.len());
        self.registry.resources.push(Arc::new(resource));
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        info!(
            resources = self.registry.len(),
            "Resource registry initialized"
        );
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;

    fn resource(name: &str) -> ResourceDefinition {
        ResourceDefinition::builder(name, name)
            .field(FieldDescriptor::text("name"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_registration_order_and_lookup() {
        let registry = ResourceRegistry::builder()
            .register(resource("products"))
            .unwrap()
            .register(resource("brands"))
            .unwrap()
            .build();

        let names: Vec<&str> = registry.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["products", "brands"]);
        assert_eq!(registry.get("brands").unwrap().entity(), "brands");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_resource() {
        let registry = ResourceRegistry::builder().build();
        assert!(registry.is_empty());
        assert_eq!(
            registry.get("orders").unwrap_err(),
            SchemaError::UnknownResource {
                name: "orders".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_resource_is_rejected() {
        let err = ResourceRegistry::builder()
            .register(resource("products"))
            .unwrap()
            .register(resource("products"))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateResource {
                name: "products".to_string()
            }
        );
    }
}
