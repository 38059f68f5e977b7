//! Chain types and definitions
//!
//! This module contains all types for declaring and loading pipeline chains:
//! - `step` - StepType and PipelineStep
//! - `params` - Typed step parameters and the tiered parameter merge
//! - `pipeline` - PipelineChain and ChainConfig
//! - `input` - Data flowing between steps
//! - `context` - StepContext shared across one chain run
//! - `expressions` - Expression evaluation for `${{ }}` syntax
//! - `loader` - Load chains from files and directories
//! - `runner_config` - Process-level overrides from runner.yaml

pub mod context;
pub mod expressions;
pub mod input;
pub mod loader;
pub mod params;
pub mod pipeline;
pub mod runner_config;
pub mod step;

// Re-export all public types for convenience
pub use context::StepContext;
pub use expressions::{evaluate as evaluate_expression, evaluate_params, ExpressionError};
pub use input::{MediaKind, StepInput};
pub use loader::{ChainLoader, LoadError};
pub use params::{resolve_params, DurationSpec, ParamError, ResolvedParams, StepParams};
pub use pipeline::{ChainConfig, PipelineChain};
pub use runner_config::RunnerConfig;
pub use step::{PipelineStep, StepType, UnknownStepType};
