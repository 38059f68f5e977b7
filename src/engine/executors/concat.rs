//! Executor for concat_videos

use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use super::{invoke, prepare, StepExecutor};
use crate::chain::{ChainConfig, PipelineStep, StepContext, StepInput, StepType};
use crate::engine::result::{StepError, StepResult};
use crate::generator::{GenerationRequest, Generator};
use crate::registry::ModelRegistry;

pub struct ConcatExecutor {
    generator: Arc<dyn Generator>,
    registry: Arc<ModelRegistry>,
}

impl ConcatExecutor {
    pub fn new(generator: Arc<dyn Generator>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            generator,
            registry,
        }
    }

    /// Explicit `video_paths` win over the previous step's output
    fn candidate_paths(
        step: &PipelineStep,
        input: Option<&StepInput>,
    ) -> Result<Vec<PathBuf>, StepError> {
        if let Some(paths) = &step.params.video_paths {
            return Ok(paths.clone());
        }

        input
            .map(StepInput::local_paths)
            .ok_or_else(|| StepError::MissingInput("No video paths provided".to_string()))
    }

    fn existing_videos(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, StepError> {
        let total = paths.len();
        let (valid, missing): (Vec<_>, Vec<_>) = paths.into_iter().partition(|p| p.is_file());

        for path in &missing {
            warn!("Skipping missing video: {}", path.display());
        }

        if valid.is_empty() {
            return Err(StepError::MissingInput(format!(
                "No valid video files to concatenate (none of {} paths exist)",
                total
            )));
        }

        Ok(valid)
    }
}

#[async_trait]
impl StepExecutor for ConcatExecutor {
    async fn execute(
        &self,
        step: &PipelineStep,
        input: Option<&StepInput>,
        config: &ChainConfig,
        context: &StepContext,
    ) -> StepResult {
        let videos = match Self::candidate_paths(step, input).and_then(Self::existing_videos) {
            Ok(videos) => videos,
            Err(e) => return StepResult::failure(&step.model, e),
        };

        let (definition, params) = match prepare(&self.registry, step, config, context) {
            Ok(prepared) => prepared,
            Err(e) => return StepResult::failure(&step.model, e),
        };

        let video_count = videos.len();
        let request = GenerationRequest {
            step_type: StepType::ConcatVideos,
            model: step.model.clone(),
            endpoint: definition.endpoint.clone(),
            input: Some(StepInput::Files(videos)),
            params,
            execution_id: context.execution_id.clone(),
        };

        invoke(self.generator.as_ref(), request)
            .await
            .with_cost(0.0)
            .with_metadata("video_count", json!(video_count))
    }
}
