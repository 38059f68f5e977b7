//! Model definitions and pricing

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::params::ResolvedParams;
use crate::chain::StepType;

/// How a model bills a single generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Pricing {
    /// Flat cost per call
    Fixed { cost: f64 },
    /// Cost per second of generated media
    PerSecond { rate: f64 },
    /// Cost per generated image
    PerImage { rate: f64 },
    /// Cost per minute of processed audio
    PerMinute { rate: f64 },
    /// Cost per 1,000 characters of input text
    PerThousandCharacters { rate: f64 },
    /// No external cost (local processing)
    Free,
}

impl Pricing {
    /// Estimate the cost of one call, using `fallback` when the parameters
    /// do not carry the quantity being billed
    pub fn estimate(&self, params: &ResolvedParams, fallback: f64) -> f64 {
        match self {
            Pricing::Fixed { cost } => *cost,
            Pricing::PerSecond { rate } => params
                .duration_seconds()
                .map(|secs| rate * secs)
                .unwrap_or(fallback),
            Pricing::PerImage { rate } => rate * params.get_u64("num_images").unwrap_or(1) as f64,
            Pricing::PerMinute { .. } => fallback,
            Pricing::PerThousandCharacters { rate } => params
                .get_str("text")
                .map(|text| rate * text.chars().count() as f64 / 1000.0)
                .unwrap_or(fallback),
            Pricing::Free => 0.0,
        }
    }
}

/// Immutable descriptor for one provider/model combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub key: String,
    pub name: String,
    pub provider: String,
    pub endpoint: String,
    pub categories: Vec<StepType>,
    #[serde(default)]
    pub description: String,
    pub pricing: Pricing,
    #[serde(default)]
    pub duration_options: Vec<String>,
    #[serde(default)]
    pub resolutions: Vec<String>,
    #[serde(default)]
    pub aspect_ratios: Vec<String>,
    #[serde(default)]
    pub defaults: Map<String, Value>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub max_duration: Option<f64>,
    /// Typical cost of one call in USD
    pub cost_estimate: f64,
    /// Typical processing time in seconds
    pub processing_time: f64,
}

impl ModelDefinition {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            provider: provider.into(),
            endpoint: endpoint.into(),
            categories: vec![],
            description: String::new(),
            pricing: Pricing::Free,
            duration_options: vec![],
            resolutions: vec![],
            aspect_ratios: vec![],
            defaults: Map::new(),
            features: vec![],
            max_duration: None,
            cost_estimate: 0.0,
            processing_time: 0.0,
        }
    }

    pub fn category(mut self, step_type: StepType) -> Self {
        if !self.categories.contains(&step_type) {
            self.categories.push(step_type);
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn cost_estimate(mut self, cost: f64) -> Self {
        self.cost_estimate = cost;
        self
    }

    pub fn processing_time(mut self, seconds: f64) -> Self {
        self.processing_time = seconds;
        self
    }

    pub fn durations(mut self, options: &[&str]) -> Self {
        self.duration_options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn resolutions(mut self, options: &[&str]) -> Self {
        self.resolutions = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn aspect_ratios(mut self, options: &[&str]) -> Self {
        self.aspect_ratios = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn max_duration(mut self, seconds: f64) -> Self {
        self.max_duration = Some(seconds);
        self
    }

    /// Set provider defaults from a JSON object; other values are ignored
    pub fn defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.defaults = map;
        }
        self
    }

    pub fn supports(&self, step_type: StepType) -> bool {
        self.categories.contains(&step_type)
    }

    /// Estimated cost of one call with the given effective parameters
    pub fn estimate_cost(&self, params: &ResolvedParams) -> f64 {
        self.pricing.estimate(params, self.cost_estimate)
    }
}
