//! # AI Content Pipeline
//!
//! A declarative engine for multi-stage content generation: describe a chain
//! of typed steps (text → image → video → audio ...), bind each step to a
//! model from the registry, and run it end to end while tracking cost,
//! timing and intermediate artifacts.
//!
//! ## Features
//!
//! - **Declarative YAML chains** - Steps, models and parameters in one file
//! - **Model registry** - Provider metadata, pricing and defaults per model key
//! - **Step context** - Later steps read values earlier steps produced
//! - **Cost ceiling** - Abort before a step would exceed the configured budget
//! - **Reports** - JSON execution reports with cost and timing breakdowns
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ai_content_pipeline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let chain_yaml = r#"
//! name: image-to-video
//! steps:
//!   - type: text_to_image
//!     model: flux_dev
//!     params:
//!       prompt: "a lighthouse at dawn"
//!   - type: image_to_video
//!     model: veo3
//! "#;
//!
//!     let chain = ChainLoader::from_yaml(chain_yaml)?;
//!     let registry = Arc::new(ModelRegistry::with_builtin_models());
//!     let runner = ChainRunner::dry_run(registry, None);
//!
//!     let report = runner.run(&chain, None).await;
//!     println!("Chain finished: status={:?}", report.execution_summary.status);
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod engine;
pub mod generator;
pub mod registry;

// Re-export main types
pub use chain::{
    ChainConfig, ChainLoader, LoadError, MediaKind, PipelineChain, PipelineStep, RunnerConfig,
    StepContext, StepInput, StepParams, StepType,
};
pub use engine::{
    ChainError, ChainRunner, ExecutionReport, RunStatus, StepError, StepExecutor, StepResult,
};
pub use generator::{
    DryRunGenerator, GeneratedArtifact, GenerationRequest, Generator, GeneratorError,
    GeneratorOutput,
};
pub use registry::{ModelDefinition, ModelRegistry, Pricing, RegistryError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{
        ChainConfig, ChainLoader, PipelineChain, PipelineStep, RunnerConfig, StepInput,
        StepParams, StepType,
    };
    pub use crate::engine::{ChainRunner, ExecutionReport, RunStatus, StepResult};
    pub use crate::generator::{
        DryRunGenerator, GeneratedArtifact, GenerationRequest, Generator, GeneratorError,
        GeneratorOutput,
    };
    pub use crate::registry::{ModelDefinition, ModelRegistry, Pricing};
}
