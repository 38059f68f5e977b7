//! Step executors
//!
//! One executor per step type. Each executor:
//! 1. Resolves effective parameters (shared merge + expressions)
//! 2. Checks the input it needs before any external call
//! 3. Delegates the call to its injected generator
//! 4. Normalizes the generator output into a `StepResult`
//!
//! Executors never return errors; every failure becomes a failed `StepResult`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub mod concat;
pub mod generation;
pub mod media;

pub use concat::ConcatExecutor;
pub use generation::GenerationExecutor;
pub use media::MediaExecutor;

use crate::chain::{
    evaluate_params, resolve_params, ChainConfig, PipelineStep, ResolvedParams, StepContext,
    StepInput, StepType,
};
use crate::engine::result::{StepError, StepResult};
use crate::generator::{GenerationRequest, Generator, GeneratorOutput};
use crate::registry::{ModelDefinition, ModelRegistry};

/// Executes one step given its input, the chain config and the run context
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        step: &PipelineStep,
        input: Option<&StepInput>,
        config: &ChainConfig,
        context: &StepContext,
    ) -> StepResult;
}

/// Build the executor that handles `step_type`, backed by `generator`
pub fn executor_for(
    step_type: StepType,
    generator: Arc<dyn Generator>,
    registry: Arc<ModelRegistry>,
) -> Box<dyn StepExecutor> {
    match step_type {
        StepType::ConcatVideos => Box::new(ConcatExecutor::new(generator, registry)),
        t if t.requires_local_file() => Box::new(MediaExecutor::new(t, generator, registry)),
        _ => Box::new(GenerationExecutor::new(step_type, generator, registry)),
    }
}

/// Parameters as the tiered merge produces them, before expressions
pub fn effective_params(
    definition: &ModelDefinition,
    step: &PipelineStep,
    config: &ChainConfig,
) -> ResolvedParams {
    resolve_params(
        step.step_type,
        &step.params,
        &config.defaults,
        &definition.defaults,
    )
}

/// Resolve the model and the fully expanded parameters for a step
pub(crate) fn prepare<'r>(
    registry: &'r ModelRegistry,
    step: &PipelineStep,
    config: &ChainConfig,
    context: &StepContext,
) -> Result<(&'r ModelDefinition, ResolvedParams), StepError> {
    let definition = registry
        .get_for(step.step_type, &step.model)
        .map_err(|e| StepError::Configuration(e.to_string()))?;

    let mut params = effective_params(definition, step, config);
    evaluate_params(&mut params, context)
        .map_err(|e| StepError::Configuration(format!("Parameter expression failed: {}", e)))?;

    Ok((definition, params))
}

/// Call the generator and normalize whatever comes back
pub(crate) async fn invoke(generator: &dyn Generator, request: GenerationRequest) -> StepResult {
    let started = Instant::now();
    debug!(
        "Calling generator for {} ({})",
        request.step_type, request.endpoint
    );

    let outcome = generator.generate(&request).await;
    let elapsed = started.elapsed().as_secs_f64();

    match outcome {
        Ok(GeneratorOutput::Success(artifact)) => {
            let time = if artifact.processing_time > 0.0 {
                artifact.processing_time
            } else {
                elapsed
            };
            let mut result = StepResult::success(model_used(&artifact.model_used, &request.model))
                .with_cost(artifact.cost_estimate)
                .with_time(time);
            result.output_path = artifact.output_path;
            result.output_url = artifact.output_url;
            result.metadata = artifact.metadata;
            result
        }
        Ok(GeneratorOutput::Failure {
            error,
            cost_estimate,
            processing_time,
            model_used: used,
        }) => {
            let time = if processing_time > 0.0 {
                processing_time
            } else {
                elapsed
            };
            StepResult::failure(
                model_used(&used, &request.model),
                StepError::Provider(failure_message(error)),
            )
            .with_cost(cost_estimate)
            .with_time(time)
        }
        Err(e) => StepResult::failure(
            &request.model,
            StepError::Provider(failure_message(e.to_string())),
        )
        .with_time(elapsed),
    }
}

/// Failed results always carry a non-empty message
fn failure_message(message: String) -> String {
    if message.trim().is_empty() {
        "Generation failed".to_string()
    } else {
        message
    }
}

fn model_used(reported: &str, requested: &str) -> String {
    if reported.is_empty() {
        requested.to_string()
    } else {
        reported.to_string()
    }
}

/// Take a string parameter, ignoring blanks
pub(crate) fn non_empty<'a>(params: &'a ResolvedParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
