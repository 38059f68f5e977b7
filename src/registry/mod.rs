//! Model registry
//!
//! Maps logical model keys (e.g. `"flux_dev"`) to provider metadata. The
//! registry is built once at startup and passed by reference to the runner
//! and validators; it is read-only while chains execute.

use std::collections::{BTreeMap, HashMap};

pub mod catalog;
pub mod definition;
pub mod validate;

pub use catalog::register_builtin_models;
pub use definition::{ModelDefinition, Pricing};
pub use validate::{validate_definitions, RegistryIssue};

use crate::chain::StepType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model '{model}' does not support {step_type}")]
    CategoryMismatch { model: String, step_type: StepType },
}

/// Catalog of model definitions keyed by model key
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDefinition>,
    /// Registration order; listings follow it
    order: Vec<String>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalog
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::new();
        register_builtin_models(&mut registry);
        registry
    }

    /// Insert a definition, replacing any previous one with the same key
    pub fn register(&mut self, definition: ModelDefinition) {
        if !self.models.contains_key(&definition.key) {
            self.order.push(definition.key.clone());
        }
        self.models.insert(definition.key.clone(), definition);
    }

    pub fn get(&self, key: &str) -> Result<&ModelDefinition, RegistryError> {
        self.models
            .get(key)
            .ok_or_else(|| RegistryError::UnknownModel(key.to_string()))
    }

    /// Resolve a model key that must serve the given step type
    pub fn get_for(&self, step_type: StepType, key: &str) -> Result<&ModelDefinition, RegistryError> {
        let definition = self.get(key)?;
        if !definition.supports(step_type) {
            return Err(RegistryError::CategoryMismatch {
                model: key.to_string(),
                step_type,
            });
        }
        Ok(definition)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// All definitions in registration order
    pub fn all(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.order.iter().filter_map(|key| self.models.get(key))
    }

    /// Model keys serving a category, in registration order
    pub fn keys_for_category(&self, category: StepType) -> Vec<String> {
        self.list_by_category(category)
            .into_iter()
            .map(|def| def.key.clone())
            .collect()
    }

    /// Definitions serving a category, in registration order
    pub fn list_by_category(&self, category: StepType) -> Vec<&ModelDefinition> {
        self.all().filter(|def| def.supports(category)).collect()
    }

    /// Category -> model keys, for every category with at least one model
    pub fn get_supported_models(&self) -> BTreeMap<StepType, Vec<String>> {
        StepType::ALL
            .iter()
            .map(|&category| (category, self.keys_for_category(category)))
            .filter(|(_, keys)| !keys.is_empty())
            .collect()
    }

    /// Category -> model key -> typical cost (USD)
    pub fn get_cost_estimates(&self) -> BTreeMap<StepType, BTreeMap<String, f64>> {
        self.project(|def| def.cost_estimate)
    }

    /// Category -> model key -> typical processing time (seconds)
    pub fn get_processing_times(&self) -> BTreeMap<StepType, BTreeMap<String, f64>> {
        self.project(|def| def.processing_time)
    }

    fn project<F>(&self, value: F) -> BTreeMap<StepType, BTreeMap<String, f64>>
    where
        F: Fn(&ModelDefinition) -> f64,
    {
        let mut out: BTreeMap<StepType, BTreeMap<String, f64>> = BTreeMap::new();
        for def in self.all() {
            for &category in &def.categories {
                out.entry(category)
                    .or_default()
                    .insert(def.key.clone(), value(def));
            }
        }
        out
    }

    /// Run the consistency self-test over every registered definition
    pub fn validate(&self) -> Vec<RegistryIssue> {
        validate_definitions(self.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_model(key: &str, cost: f64) -> ModelDefinition {
        ModelDefinition::new(key, key.to_uppercase(), "fal", format!("fal-ai/{}", key))
            .category(StepType::TextToImage)
            .pricing(Pricing::Fixed { cost })
            .cost_estimate(cost)
            .processing_time(10.0)
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ModelRegistry::new();
        registry.register(image_model("alpha", 0.01));

        assert_eq!(registry.get("alpha").unwrap().cost_estimate, 0.01);
        assert_eq!(
            registry.get("missing"),
            Err(RegistryError::UnknownModel("missing".to_string()))
        );
    }

    #[test]
    fn test_last_write_wins_and_keeps_position() {
        let mut registry = ModelRegistry::new();
        registry.register(image_model("alpha", 0.01));
        registry.register(image_model("beta", 0.02));

        let replacement = image_model("alpha", 0.05).description("replaced");
        registry.register(replacement.clone());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("alpha").unwrap(), &replacement);
        assert_eq!(
            registry.keys_for_category(StepType::TextToImage),
            vec!["alpha".to_string(), "beta".to_string()]
        );
    }

    #[test]
    fn test_get_for_checks_category() {
        let mut registry = ModelRegistry::new();
        registry.register(image_model("alpha", 0.01));

        assert!(registry.get_for(StepType::TextToImage, "alpha").is_ok());
        assert!(matches!(
            registry.get_for(StepType::ImageToVideo, "alpha"),
            Err(RegistryError::CategoryMismatch { .. })
        ));
    }

    #[test]
    fn test_projections() {
        let mut registry = ModelRegistry::new();
        registry.register(image_model("alpha", 0.01));

        let costs = registry.get_cost_estimates();
        assert_eq!(costs[&StepType::TextToImage]["alpha"], 0.01);

        let times = registry.get_processing_times();
        assert_eq!(times[&StepType::TextToImage]["alpha"], 10.0);

        let supported = registry.get_supported_models();
        assert_eq!(supported.len(), 1);
        assert!(!supported.contains_key(&StepType::Avatar));
    }
}
