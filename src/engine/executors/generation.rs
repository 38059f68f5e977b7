//! Executor for API-backed generation steps
//!
//! Covers the text-to-X, image-to-X, analysis and speech steps. What differs
//! between them is only where the prompt or text comes from. The previous
//! step's output is handed to the generator as is; only a local file that
//! has gone missing is rejected before the call.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{invoke, non_empty, prepare, StepExecutor};
use crate::chain::{ChainConfig, PipelineStep, ResolvedParams, StepContext, StepInput, StepType};
use crate::engine::result::{StepError, StepResult};
use crate::generator::{GenerationRequest, Generator};
use crate::registry::ModelRegistry;

pub struct GenerationExecutor {
    step_type: StepType,
    generator: Arc<dyn Generator>,
    registry: Arc<ModelRegistry>,
}

impl GenerationExecutor {
    pub fn new(
        step_type: StepType,
        generator: Arc<dyn Generator>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            step_type,
            generator,
            registry,
        }
    }

    /// Fill the prompt/text parameter from the context or a text input
    fn apply_text_sources(
        &self,
        params: &mut ResolvedParams,
        input: Option<&StepInput>,
        context: &StepContext,
    ) -> Result<(), StepError> {
        if self.step_type.prefers_generated_prompt() {
            if let Some(prompt) = context.generated_prompt() {
                debug!("Using generated prompt from context for {}", self.step_type);
                params.insert("prompt", json!(prompt));
            }
            return Ok(());
        }

        let key = match self.step_type {
            StepType::TextToImage | StepType::TextToVideo => "prompt",
            StepType::TextToSpeech => "text",
            _ => return Ok(()),
        };

        if non_empty(params, key).is_some() {
            return Ok(());
        }

        match input.and_then(StepInput::as_text) {
            Some(text) if !text.trim().is_empty() => {
                params.insert(key, json!(text));
                Ok(())
            }
            _ => Err(StepError::MissingInput(format!(
                "{} requires '{}': set it in params or pass text input",
                self.step_type, key
            ))),
        }
    }

    /// Input handed to the generator; only a local file is checked here
    fn checked_input(input: Option<&StepInput>) -> Result<Option<StepInput>, StepError> {
        match input {
            Some(StepInput::File(path)) if !path.exists() => Err(StepError::MissingInput(
                format!("Input file not found: {}", path.display()),
            )),
            other => Ok(other.cloned()),
        }
    }
}

#[async_trait]
impl StepExecutor for GenerationExecutor {
    async fn execute(
        &self,
        step: &PipelineStep,
        input: Option<&StepInput>,
        config: &ChainConfig,
        context: &StepContext,
    ) -> StepResult {
        let (definition, mut params) = match prepare(&self.registry, step, config, context) {
            Ok(prepared) => prepared,
            Err(e) => return StepResult::failure(&step.model, e),
        };

        let media = match self
            .apply_text_sources(&mut params, input, context)
            .and_then(|_| Self::checked_input(input))
        {
            Ok(media) => media,
            Err(e) => return StepResult::failure(&step.model, e),
        };

        let request = GenerationRequest {
            step_type: self.step_type,
            model: step.model.clone(),
            endpoint: definition.endpoint.clone(),
            input: media,
            params,
            execution_id: context.execution_id.clone(),
        };

        invoke(self.generator.as_ref(), request).await
    }
}
