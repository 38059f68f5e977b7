//! Dry-run generator
//!
//! Answers every request successfully without contacting a provider. The
//! reported cost is the registry estimate for the effective parameters, so a
//! dry run doubles as a cost preview that exercises the whole chain.

use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{GeneratedArtifact, GenerationRequest, Generator, GeneratorError, GeneratorOutput};
use crate::chain::{MediaKind, StepType};
use crate::registry::ModelRegistry;

pub struct DryRunGenerator {
    registry: Arc<ModelRegistry>,
    /// When set, placeholder files are written here so that steps needing a
    /// local file can run; otherwise outputs are `dry-run://` URLs
    artifact_dir: Option<PathBuf>,
}

impl DryRunGenerator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            artifact_dir: None,
        }
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    fn extension(step_type: StepType, request: &GenerationRequest) -> &'static str {
        let input = request
            .input
            .as_ref()
            .and_then(|i| i.media_kind())
            .unwrap_or(MediaKind::Text);

        match step_type.output_kind(input) {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
            MediaKind::Text if step_type == StepType::GenerateSubtitles => "srt",
            MediaKind::Text => "txt",
        }
    }
}

#[async_trait]
impl Generator for DryRunGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let cost = self
            .registry
            .get(&request.model)
            .map(|def| def.estimate_cost(&request.params))
            .unwrap_or(0.0);

        let mut artifact = GeneratedArtifact::new(&request.model)
            .with_cost(cost)
            .with_metadata("dry_run", json!(true));

        match request.step_type {
            StepType::PromptGeneration => {
                let prompt = format!(
                    "[dry-run] {} motion prompt",
                    request.params.get_str("video_style").unwrap_or("cinematic")
                );
                return Ok(artifact.with_metadata("extracted_prompt", json!(prompt)).into());
            }
            StepType::ImageUnderstanding => {
                return Ok(artifact
                    .with_metadata("analysis", json!("[dry-run] image analysis"))
                    .into());
            }
            StepType::SpeechToText => {
                artifact = artifact.with_metadata("transcript", json!("[dry-run] transcript"));
            }
            _ => {}
        }

        let file_name = format!(
            "{}_{}.{}",
            request.model,
            Uuid::new_v4().simple(),
            Self::extension(request.step_type, request)
        );

        let artifact = match &self.artifact_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(&file_name);
                tokio::fs::write(&path, b"").await?;
                debug!("Dry-run placeholder written to {}", path.display());
                artifact.with_path(path)
            }
            None => artifact.with_url(format!("dry-run://{}/{}", request.execution_id, file_name)),
        };

        Ok(artifact.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ResolvedParams, StepInput};

    fn request(step_type: StepType, model: &str) -> GenerationRequest {
        let mut params = ResolvedParams::default();
        params.insert("duration", json!("8s"));
        GenerationRequest {
            step_type,
            model: model.to_string(),
            endpoint: String::new(),
            input: Some(StepInput::Url("https://cdn.example.com/frame.png".into())),
            params,
            execution_id: "exec_test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dry_run_uses_registry_pricing() {
        let generator = DryRunGenerator::new(Arc::new(ModelRegistry::with_builtin_models()));
        let output = generator
            .generate(&request(StepType::ImageToVideo, "veo3"))
            .await
            .unwrap();

        match output {
            GeneratorOutput::Success(artifact) => {
                assert_eq!(artifact.cost_estimate, 4.0);
                assert_eq!(artifact.processing_time, 0.0);
                let url = artifact.output_url.unwrap();
                assert!(url.starts_with("dry-run://exec_test/veo3_"));
                assert!(url.ends_with(".mp4"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prompt_generation_has_no_artifact() {
        let generator = DryRunGenerator::new(Arc::new(ModelRegistry::with_builtin_models()));
        let output = generator
            .generate(&request(StepType::PromptGeneration, "openrouter_video_prompt"))
            .await
            .unwrap();

        let GeneratorOutput::Success(artifact) = output else {
            panic!("expected success");
        };
        assert!(artifact.output_url.is_none());
        assert!(artifact.metadata.contains_key("extracted_prompt"));
    }

    #[tokio::test]
    async fn test_placeholder_files() {
        let dir = tempfile::tempdir().unwrap();
        let generator = DryRunGenerator::new(Arc::new(ModelRegistry::with_builtin_models()))
            .with_artifact_dir(dir.path());

        let output = generator
            .generate(&request(StepType::TextToImage, "flux_dev"))
            .await
            .unwrap();
        let GeneratorOutput::Success(artifact) = output else {
            panic!("expected success");
        };
        assert!(artifact.output_path.unwrap().exists());
    }
}
