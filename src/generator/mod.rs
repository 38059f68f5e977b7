//! Generator boundary
//!
//! A generator is the provider-specific collaborator that performs the actual
//! generation call. Executors hand it a fully resolved [`GenerationRequest`]
//! and receive one tagged [`GeneratorOutput`]; building provider payloads is
//! the generator's job, never the executor's.
//!
//! - `response` - Normalizer for the JSON shapes providers return
//! - `dry_run` - Generator that fakes successful calls from registry pricing

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub mod dry_run;
pub mod response;

pub use dry_run::DryRunGenerator;

use crate::chain::{ResolvedParams, StepInput, StepType};

/// Errors raised by a generator instead of returning a failure output
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Everything a generator needs for one call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub step_type: StepType,
    /// Model key as declared on the step
    pub model: String,
    /// Provider endpoint from the model definition
    pub endpoint: String,
    pub input: Option<StepInput>,
    /// Effective parameters after the tiered merge and expression expansion
    pub params: ResolvedParams,
    pub execution_id: String,
}

impl GenerationRequest {
    pub fn prompt(&self) -> Option<&str> {
        self.params.get_str("prompt")
    }
}

/// Artifact and accounting data from a successful call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedArtifact {
    pub output_path: Option<PathBuf>,
    pub output_url: Option<String>,
    /// Seconds; zero means "not reported"
    pub processing_time: f64,
    /// USD
    pub cost_estimate: f64,
    pub model_used: String,
    pub metadata: Map<String, Value>,
}

impl GeneratedArtifact {
    pub fn new(model_used: impl Into<String>) -> Self {
        Self {
            model_used: model_used.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.output_url = Some(url.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost_estimate = cost;
        self
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.processing_time = seconds;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Result of one generator call
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorOutput {
    Success(GeneratedArtifact),
    Failure {
        error: String,
        /// Cost the provider still charged, if any
        cost_estimate: f64,
        processing_time: f64,
        model_used: String,
    },
}

impl GeneratorOutput {
    pub fn failure(model_used: impl Into<String>, error: impl Into<String>) -> Self {
        GeneratorOutput::Failure {
            error: error.into(),
            cost_estimate: 0.0,
            processing_time: 0.0,
            model_used: model_used.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GeneratorOutput::Success(_))
    }
}

impl From<GeneratedArtifact> for GeneratorOutput {
    fn from(artifact: GeneratedArtifact) -> Self {
        GeneratorOutput::Success(artifact)
    }
}

/// Provider-specific collaborator performing one kind of generation
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GeneratorOutput, GeneratorError>;
}
