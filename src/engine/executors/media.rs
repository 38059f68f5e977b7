//! Executor for steps that modify an existing video file
//!
//! add_audio, upscale_video and generate_subtitles all work on a local file
//! produced earlier in the chain. A missing file is reported here, before the
//! generator is called, so no cost is spent on a call that cannot succeed.

use async_trait::async_trait;
use std::sync::Arc;

use super::{invoke, prepare, StepExecutor};
use crate::chain::{ChainConfig, PipelineStep, StepContext, StepInput, StepType};
use crate::engine::result::{StepError, StepResult};
use crate::generator::{GenerationRequest, Generator};
use crate::registry::ModelRegistry;

pub struct MediaExecutor {
    step_type: StepType,
    generator: Arc<dyn Generator>,
    registry: Arc<ModelRegistry>,
}

impl MediaExecutor {
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

    fn local_video(&self, input: Option<&StepInput>) -> Result<StepInput, StepError> {
        match input {
            None => Err(StepError::MissingInput(format!(
                "{} requires a video file from the previous step, got none",
                self.step_type
            ))),
            Some(StepInput::File(path)) if path.is_file() => Ok(StepInput::File(path.clone())),
            Some(StepInput::File(path)) => Err(StepError::MissingInput(format!(
                "Video file not found: {}",
                path.display()
            ))),
            Some(other) => Err(StepError::MissingInput(format!(
                "{} requires a local video file, got '{}'",
                self.step_type, other
            ))),
        }
    }
}

#[async_trait]
impl StepExecutor for MediaExecutor {
    async fn execute(
        &self,
        step: &PipelineStep,
        input: Option<&StepInput>,
        config: &ChainConfig,
        context: &StepContext,
    ) -> StepResult {
        let video = match self.local_video(input) {
            Ok(video) => video,
            Err(e) => return StepResult::failure(&step.model, e),
        };

        let (definition, params) = match prepare(&self.registry, step, config, context) {
            Ok(prepared) => prepared,
            Err(e) => return StepResult::failure(&step.model, e),
        };

        let request = GenerationRequest {
            step_type: self.step_type,
            model: step.model.clone(),
            endpoint: definition.endpoint.clone(),
            input: Some(video),
            params,
            execution_id: context.execution_id.clone(),
        };

        let result = invoke(self.generator.as_ref(), request).await;

        if self.step_type.is_local() {
            result.with_cost(0.0)
        } else {
            result
        }
    }
}
