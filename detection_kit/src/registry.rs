//! Collector Registry
//!
//! Wires one collector to each catalog technique. A registry is validated
//! before any scan runs: a duplicate or missing technique is a wiring defect,
//! not a host condition.

use std::collections::BTreeMap;

use crate::catalog::TechniqueId;
use crate::collectors::{self, TechniqueCollector};

/// Errors raised while assembling a registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Technique '{technique}' already has collector '{existing}'")]
    DuplicateTechnique {
        technique: TechniqueId,
        existing: String,
    },

    #[error("No collector registered for technique '{0}'")]
    MissingTechnique(TechniqueId),
}

/// Set of collectors keyed by technique
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: BTreeMap<TechniqueId, Box<dyn TechniqueCollector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector for its technique
    pub fn register(&mut self, collector: Box<dyn TechniqueCollector>) -> Result<(), RegistryError> {
        let technique = collector.technique();
        if let Some(existing) = self.collectors.get(&technique) {
            return Err(RegistryError::DuplicateTechnique {
                technique,
                existing: existing.collector_id().to_string(),
            });
        }

        log::debug!(
            "Registered collector '{}' for '{}'",
            collector.collector_id(),
            technique
        );
        self.collectors.insert(technique, collector);
        Ok(())
    }

    /// Check that every technique has a collector
    pub fn validate(&self) -> Result<(), RegistryError> {
        match TechniqueId::ALL
            .into_iter()
            .find(|id| !self.collectors.contains_key(id))
        {
            Some(missing) => Err(RegistryError::MissingTechnique(missing)),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    pub fn contains(&self, technique: TechniqueId) -> bool {
        self.collectors.contains_key(&technique)
    }

    /// Validate and return the collectors in catalog order
    pub fn into_plan(self) -> Result<Vec<Box<dyn TechniqueCollector>>, RegistryError> {
        self.validate()?;
        // BTreeMap iterates in TechniqueId order, which is catalog order
        Ok(self.collectors.into_values().collect())
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.collectors
                    .iter()
                    .map(|(id, c)| (id, c.collector_id())),
            )
            .finish()
    }
}

/// Create a registry with all built-in collectors
pub fn create_default_registry() -> Result<CollectorRegistry, RegistryError> {
    let mut registry = CollectorRegistry::new();

    registry.register(Box::new(collectors::FileSystemCollector::new()))?;
    registry.register(Box::new(collectors::UrlSchemesCollector::new()))?;
    registry.register(Box::new(collectors::SandboxIntegrityCollector::new()))?;
    registry.register(Box::new(collectors::DynamicLibrariesCollector::new()))?;
    registry.register(Box::new(collectors::ForkRestrictionCollector::new()))?;
    registry.register(Box::new(collectors::SymbolicLinksCollector::new()))?;
    registry.register(Box::new(collectors::SystemCallsCollector::new()))?;
    registry.register(Box::new(collectors::EnvironmentVariablesCollector::new()))?;

    Ok(registry)
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_is_complete() {
        let registry = create_default_registry().unwrap();
        assert_eq!(registry.len(), 8);
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_plan_follows_catalog_order() {
        let plan = create_default_registry().unwrap().into_plan().unwrap();
        let order: Vec<TechniqueId> = plan.iter().map(|c| c.technique()).collect();
        assert_eq!(order, TechniqueId::ALL.to_vec());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = create_default_registry().unwrap();
        let err = registry
            .register(Box::new(collectors::SystemCallsCollector::new()))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTechnique {
                technique: TechniqueId::SystemCalls,
                existing: "system_calls_collector".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_technique_rejected() {
        let mut registry = CollectorRegistry::new();
        registry
            .register(Box::new(collectors::FileSystemCollector::new()))
            .unwrap();
        assert_eq!(
            registry.validate(),
            Err(RegistryError::MissingTechnique(TechniqueId::UrlSchemes))
        );
        assert!(registry.into_plan().is_err());
    }
}
