//! Chain Runner - drives a pipeline chain from first step to report
//!
//! The runner:
//! 1. Validates the chain against the registry and its executor table
//! 2. Executes enabled steps strictly in order
//! 3. Feeds each step's primary artifact to the next step
//! 4. Writes step contributions into the shared StepContext
//! 5. Accumulates cost and time, enforces the cost ceiling
//! 6. Builds and persists the execution report
//!
//! `run` never fails: configuration problems, missing inputs, provider
//! failures and executor panics all end up in the returned report.

use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::chain::context::{GENERATED_PROMPT, IMAGE_ANALYSIS, TRANSCRIPT};
use crate::chain::{
    ChainConfig, MediaKind, PipelineChain, PipelineStep, StepContext, StepInput, StepType,
};
use crate::engine::artifacts::ArtifactDownloader;
use crate::engine::error::ChainError;
use crate::engine::executors::{effective_params, executor_for, StepExecutor};
use crate::engine::report::{
    build_execution_report, build_intermediate_report, save_execution_report,
    save_intermediate_report, CostEntry, ExecutionReport, RunLog, StepRecord,
};
use crate::engine::result::{StepError, StepResult};
use crate::generator::{DryRunGenerator, Generator};
use crate::registry::ModelRegistry;

/// Metadata keys copied into the context after a successful step
const CONTEXT_PROPAGATION: &[(StepType, &str, &str)] = &[
    (StepType::PromptGeneration, "extracted_prompt", GENERATED_PROMPT),
    (StepType::ImageUnderstanding, "analysis", IMAGE_ANALYSIS),
    (StepType::SpeechToText, "transcript", TRANSCRIPT),
];

/// Where a chain run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    NotStarted,
    /// Running the step at this 1-based position
    Running(usize),
    /// Stopped at the step at this position
    Failed(usize),
    Completed,
}

/// Per-step and total cost projection for a chain
#[derive(Debug, Clone, Serialize)]
pub struct CostEstimate {
    pub by_step: Vec<CostEntry>,
    pub total_cost: f64,
}

/// Executes pipeline chains against a registry and a fixed executor table
pub struct ChainRunner {
    registry: Arc<ModelRegistry>,
    executors: HashMap<StepType, Box<dyn StepExecutor>>,
    env: HashMap<String, String>,
    downloader: ArtifactDownloader,
}

impl ChainRunner {
    /// Create a runner with no executors; add generators before running
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            executors: HashMap::new(),
            env: HashMap::new(),
            downloader: ArtifactDownloader::new(),
        }
    }

    /// Runner whose every step type is served by a [`DryRunGenerator`]
    pub fn dry_run(registry: Arc<ModelRegistry>, artifact_dir: Option<PathBuf>) -> Self {
        let mut generator = DryRunGenerator::new(Arc::clone(&registry));
        if let Some(dir) = artifact_dir {
            generator = generator.with_artifact_dir(dir);
        }
        Self::new(registry).with_default_generator(Arc::new(generator))
    }

    /// Serve `step_type` with the standard executor backed by `generator`
    pub fn with_generator(mut self, step_type: StepType, generator: Arc<dyn Generator>) -> Self {
        let executor = executor_for(step_type, generator, Arc::clone(&self.registry));
        self.executors.insert(step_type, executor);
        self
    }

    /// Use `generator` for every step type that has no executor yet
    pub fn with_default_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        for step_type in StepType::ALL {
            if !self.executors.contains_key(&step_type) {
                let executor =
                    executor_for(step_type, Arc::clone(&generator), Arc::clone(&self.registry));
                self.executors.insert(step_type, executor);
            }
        }
        self
    }

    /// Replace the executor for `step_type` outright
    pub fn with_executor(mut self, step_type: StepType, executor: Box<dyn StepExecutor>) -> Self {
        self.executors.insert(step_type, executor);
        self
    }

    /// Variables available to `${{ env.NAME }}` in step parameters
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn supports(&self, step_type: StepType) -> bool {
        self.executors.contains_key(&step_type)
    }

    // ========================================================================
    // Validation and estimation
    // ========================================================================

    /// Every configuration problem in the chain; empty means runnable
    pub fn validate(&self, chain: &PipelineChain) -> Vec<ChainError> {
        let mut problems = vec![];

        if chain.enabled_step_count() == 0 {
            problems.push(ChainError::EmptyChain(chain.name.clone()));
            return problems;
        }

        let mut flow: Option<MediaKind> = None;

        for (position, step) in chain.enabled_steps() {
            let step_type = step.step_type;

            if !self.supports(step_type) {
                problems.push(ChainError::MissingExecutor {
                    step: position,
                    step_type,
                });
            }

            if let Err(error) = self.registry.get_for(step_type, &step.model) {
                problems.push(ChainError::Model {
                    step: position,
                    error,
                });
            }

            if let Err(error) = step.params.validate(step_type) {
                problems.push(ChainError::InvalidParams {
                    step: position,
                    error,
                });
            }

            let accepted = step_type.accepted_inputs();
            if let Some(kind) = flow {
                if !accepted.contains(&kind) && !has_own_input(step) {
                    problems.push(ChainError::IncompatibleFlow {
                        step: position,
                        step_type,
                        input: kind,
                    });
                }
            }

            let consumed = flow
                .filter(|kind| accepted.contains(kind))
                .unwrap_or(accepted[0]);
            flow = Some(step_type.output_kind(consumed));
        }

        problems
    }

    /// Project the cost of every enabled step from registry pricing
    pub fn estimate_cost(&self, chain: &PipelineChain) -> Result<CostEstimate, ChainError> {
        let mut by_step = vec![];

        for (position, step) in chain.enabled_steps() {
            let definition = self
                .registry
                .get_for(step.step_type, &step.model)
                .map_err(|error| ChainError::Model {
                    step: position,
                    error,
                })?;

            by_step.push(CostEntry {
                step: position,
                step_type: step.step_type,
                model: step.model.clone(),
                cost: definition.estimate_cost(&effective_params(definition, step, &chain.config)),
            });
        }

        let total_cost = by_step.iter().map(|entry| entry.cost).sum();
        Ok(CostEstimate {
            by_step,
            total_cost,
        })
    }

    fn estimate_step(&self, step: &PipelineStep, config: &ChainConfig) -> f64 {
        self.registry
            .get(&step.model)
            .map(|def| def.estimate_cost(&effective_params(def, step, config)))
            .unwrap_or(0.0)
    }

    fn check_cost_limit(
        &self,
        step: &PipelineStep,
        config: &ChainConfig,
        spent: f64,
    ) -> Option<StepError> {
        let limit = config.max_cost?;
        let projected = spent + self.estimate_step(step, config);

        if projected > limit + 1e-9 {
            Some(StepError::CostLimitExceeded { projected, limit })
        } else {
            None
        }
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run a chain and return its execution report
    #[instrument(skip(self, chain, initial_input), fields(chain_name = %chain.name))]
    pub async fn run(
        &self,
        chain: &PipelineChain,
        initial_input: Option<StepInput>,
    ) -> ExecutionReport {
        let execution_id = format!("exec_{}", Uuid::new_v4().simple());
        let mut log = RunLog::new(&execution_id, chain.enabled_step_count());
        let mut state = ChainState::NotStarted;

        info!(
            "Starting chain: {} ({} steps, execution {})",
            chain.name, log.total_steps, execution_id
        );

        let problems = self.validate(chain);
        if !problems.is_empty() {
            for problem in &problems {
                error!("Invalid chain: {}", problem);
            }
            let message = problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            log.error = Some(StepError::Configuration(message));
            return self.finish(chain, log, None).await;
        }

        let scratch = ScratchDir::create(&chain.config.temp_dir, &execution_id).await;
        let mut config = chain.config.clone();
        config.temp_dir = scratch.path.clone();

        let mut context = StepContext::new(&execution_id);
        context.merge_env(&self.env);
        let mut input = initial_input;

        for (ordinal, (position, step)) in chain.enabled_steps().enumerate() {
            transition(&mut state, ChainState::Running(position));
            info!("{}", step_label(ordinal + 1, log.total_steps, step));

            let params = self
                .registry
                .get(&step.model)
                .map(|def| effective_params(def, step, &config).into_map())
                .unwrap_or_default();

            let mut result = match self.check_cost_limit(step, &config, log.total_cost) {
                Some(limit_error) => {
                    error!("{}", limit_error);
                    StepResult::failure(&step.model, limit_error)
                }
                None => self.dispatch(step, input.as_ref(), &config, &context).await,
            };

            let cost_limited = matches!(result.error, Some(StepError::CostLimitExceeded { .. }));

            if result.success {
                if config.save_intermediates {
                    self.save_intermediate_artifact(&mut result, &config, &execution_id, position)
                        .await;
                }
                record_context(step.step_type, position, &result, &mut context);
                if let Some(next) = next_input(step.step_type, &result) {
                    input = Some(next);
                }
                info!(
                    "Step {} completed: cost ${:.4}, {:.1}s",
                    position, result.cost, result.processing_time
                );
            } else {
                error!(
                    "Step {} failed: {}",
                    position,
                    result.error_message().unwrap_or_default()
                );
            }

            let failed = !result.success;
            log.record(StepRecord {
                position,
                step: step.clone(),
                params,
                result,
            });

            if config.save_intermediate_reports {
                let report = build_intermediate_report(chain, &log, log.records.len());
                if let Err(e) = save_intermediate_report(&report, &config.output_dir, position)
                {
                    warn!("Failed to save intermediate report: {}", e);
                }
            }

            if failed {
                if cost_limited || !config.continue_on_failure {
                    transition(&mut state, ChainState::Failed(position));
                    break;
                }
                warn!("Continuing after failed step {}", position);
            }
        }

        if let ChainState::Running(position) = state {
            let next = if log.is_success() {
                ChainState::Completed
            } else {
                ChainState::Failed(position)
            };
            transition(&mut state, next);
        }

        self.finish(chain, log, Some(scratch)).await
    }

    /// Run one step's executor, converting a panic into a failed result
    async fn dispatch(
        &self,
        step: &PipelineStep,
        input: Option<&StepInput>,
        config: &ChainConfig,
        context: &StepContext,
    ) -> StepResult {
        let Some(executor) = self.executors.get(&step.step_type) else {
            return StepResult::failure(
                &step.model,
                StepError::Configuration(format!("No executor registered for {}", step.step_type)),
            );
        };

        let started = Instant::now();
        match AssertUnwindSafe(executor.execute(step, input, config, context))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Executor for {} panicked: {}", step.step_type, message);
                StepResult::failure(&step.model, StepError::Internal(message))
                    .with_time(started.elapsed().as_secs_f64())
            }
        }
    }

    async fn save_intermediate_artifact(
        &self,
        result: &mut StepResult,
        config: &ChainConfig,
        execution_id: &str,
        position: usize,
    ) {
        if result.output_path.is_some() {
            return;
        }
        let Some(url) = result.output_url.clone() else {
            return;
        };
        if !ArtifactDownloader::can_fetch(&url) {
            debug!("Not downloading {}: unsupported scheme", url);
            return;
        }

        let stem = format!("{}_step{}", execution_id, position);
        match self
            .downloader
            .download(&url, &config.intermediates_dir(), &stem)
            .await
        {
            Ok(path) => {
                result
                    .metadata
                    .insert("local_path".to_string(), json!(path.display().to_string()));
            }
            Err(e) => warn!("Could not save output of step {}: {}", position, e),
        }
    }

    async fn finish(
        &self,
        chain: &PipelineChain,
        log: RunLog,
        scratch: Option<ScratchDir>,
    ) -> ExecutionReport {
        let report = build_execution_report(chain, &log);

        if chain.config.save_reports {
            match save_execution_report(&report, &chain.config.output_dir) {
                Ok(path) => info!("Execution report saved to {}", path.display()),
                Err(e) => warn!("Failed to save execution report: {}", e),
            }
        }

        if let Some(scratch) = scratch {
            if chain.config.cleanup_temp {
                scratch.remove().await;
            }
        }

        let summary = &report.execution_summary;
        if report.is_success() {
            info!(
                "Chain {} completed: {}/{} steps, ${:.4}, {:.1}s",
                chain.name,
                summary.completed_steps,
                summary.total_steps,
                summary.total_cost,
                summary.total_time
            );
        } else {
            error!(
                "Chain {} failed after {}/{} steps: {}",
                chain.name,
                summary.completed_steps,
                summary.total_steps,
                summary.error.as_deref().unwrap_or("unknown error")
            );
        }

        report
    }
}

fn transition(state: &mut ChainState, next: ChainState) {
    debug!("Chain state: {:?} -> {:?}", state, next);
    *state = next;
}

/// Steps whose params supply the data they consume
fn has_own_input(step: &PipelineStep) -> bool {
    match step.step_type {
        StepType::TextToImage | StepType::TextToVideo => step.params.prompt.is_some(),
        StepType::TextToSpeech => step.params.text.is_some(),
        StepType::ConcatVideos => step.params.video_paths.is_some(),
        _ => false,
    }
}

/// Input for the step after a successful one; `None` keeps the current input
fn next_input(step_type: StepType, result: &StepResult) -> Option<StepInput> {
    if step_type == StepType::SpeechToText {
        if let Some(transcript) = result.metadata.get("transcript").and_then(Value::as_str) {
            return Some(StepInput::Text(transcript.to_string()));
        }
    }
    result.primary_artifact()
}

fn record_context(
    step_type: StepType,
    position: usize,
    result: &StepResult,
    context: &mut StepContext,
) {
    for (source, metadata_key, context_key) in CONTEXT_PROPAGATION {
        if *source != step_type {
            continue;
        }
        if let Some(value) = result.metadata.get(*metadata_key).and_then(Value::as_str) {
            debug!("Context: {} set by step {}", context_key, position);
            context.set(context_key, value);
        }
    }

    if let Some(artifact) = result.primary_artifact() {
        context.set(&format!("step_{}_output", position), artifact.to_string());
    }
}

/// Scratch directory owned by one run: `<temp_dir>/<execution_id>`
struct ScratchDir {
    path: PathBuf,
    /// `temp_dir` itself, when this run had to create it
    created_root: Option<PathBuf>,
}

impl ScratchDir {
    async fn create(temp_dir: &Path, execution_id: &str) -> Self {
        let created_root = (!temp_dir.exists()).then(|| temp_dir.to_path_buf());
        let path = temp_dir.join(execution_id);

        if let Err(e) = tokio::fs::create_dir_all(&path).await {
            warn!("Failed to create temp dir {}: {}", path.display(), e);
        }

        Self { path, created_root }
    }

    /// Remove this run's directory, and `temp_dir` only if the run created it
    /// and nothing else has been put there since
    async fn remove(self) {
        if self.path.exists() {
            match tokio::fs::remove_dir_all(&self.path).await {
                Ok(()) => debug!("Removed temp dir {}", self.path.display()),
                Err(e) => warn!("Failed to remove temp dir {}: {}", self.path.display(), e),
            }
        }

        if let Some(root) = self.created_root {
            if let Err(e) = tokio::fs::remove_dir(&root).await {
                debug!("Keeping temp dir {}: {}", root.display(), e);
            }
        }
    }
}

/// Log line for the `ordinal`-th of `total` enabled steps
fn step_label(ordinal: usize, total: usize, step: &PipelineStep) -> String {
    format!("Step {}/{}: {}", ordinal, total, step.display_name())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "executor panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StepParams;

    fn runner() -> ChainRunner {
        ChainRunner::dry_run(Arc::new(ModelRegistry::with_builtin_models()), None)
    }

    fn step(step_type: StepType, model: &str) -> PipelineStep {
        PipelineStep::new(step_type, model)
    }

    #[test]
    fn test_validate_accepts_image_to_video_chain() {
        let chain = PipelineChain::new("ok")
            .with_step(step(StepType::TextToImage, "flux_dev"))
            .with_step(step(StepType::PromptGeneration, "openrouter_video_prompt"))
            .with_step(step(StepType::ImageToVideo, "veo3"))
            .with_step(step(StepType::AddAudio, "thinksound"));

        assert!(runner().validate(&chain).is_empty());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let chain = PipelineChain::new("broken")
            .with_step(step(StepType::TextToImage, "no_such_model"))
            .with_step(step(StepType::TextToSpeech, "flux_dev"))
            .with_step(step(StepType::UpscaleVideo, "topaz").with_params(StepParams {
                upscale_factor: Some(20),
                ..Default::default()
            }));

        let problems = runner().validate(&chain);
        assert!(problems.iter().any(|p| matches!(p, ChainError::Model { step: 1, .. })));
        assert!(problems.iter().any(|p| matches!(p, ChainError::Model { step: 2, .. })));
        assert!(problems
            .iter()
            .any(|p| matches!(p, ChainError::IncompatibleFlow { step: 2, .. })));
        assert!(problems
            .iter()
            .any(|p| matches!(p, ChainError::InvalidParams { step: 3, .. })));
    }

    #[test]
    fn test_validate_empty_chain_and_missing_executor() {
        let empty = PipelineChain::new("empty")
            .with_step(step(StepType::TextToImage, "flux_dev").disabled());
        assert_eq!(
            runner().validate(&empty),
            vec![ChainError::EmptyChain("empty".to_string())]
        );

        let bare = ChainRunner::new(Arc::new(ModelRegistry::with_builtin_models()));
        let chain = PipelineChain::new("c").with_step(step(StepType::TextToImage, "flux_dev"));
        assert!(matches!(
            bare.validate(&chain).as_slice(),
            [ChainError::MissingExecutor { step: 1, .. }]
        ));
    }

    #[test]
    fn test_tts_with_text_param_needs_no_text_input() {
        let chain = PipelineChain::new("narrated")
            .with_step(step(StepType::TextToImage, "flux_dev"))
            .with_step(step(StepType::TextToSpeech, "elevenlabs").with_params(StepParams {
                text: Some("Welcome".into()),
                ..Default::default()
            }));
        assert!(runner().validate(&chain).is_empty());
    }

    #[test]
    fn test_estimate_cost() {
        let chain = PipelineChain::new("estimate")
            .with_step(step(StepType::TextToImage, "flux_dev"))
            .with_step(step(StepType::ImageToVideo, "veo3"))
            .with_step(step(StepType::ConcatVideos, "ffmpeg_concat"));

        let estimate = runner().estimate_cost(&chain).unwrap();
        assert_eq!(estimate.by_step.len(), 3);
        assert!((estimate.by_step[0].cost - 0.025).abs() < 1e-9);
        assert!((estimate.by_step[1].cost - 4.0).abs() < 1e-9);
        assert_eq!(estimate.by_step[2].cost, 0.0);
        assert!((estimate.total_cost - 4.025).abs() < 1e-9);
    }

    #[test]
    fn test_next_input_prefers_transcript_for_speech_to_text() {
        let result = StepResult::success("elevenlabs_scribe")
            .with_url("https://cdn.example.com/t.txt")
            .with_metadata("transcript", json!("hello there"));
        assert_eq!(
            next_input(StepType::SpeechToText, &result),
            Some(StepInput::Text("hello there".into()))
        );
        assert_eq!(
            next_input(StepType::TextToImage, &result),
            Some(StepInput::Url("https://cdn.example.com/t.txt".into()))
        );
    }

    #[test]
    fn test_record_context() {
        let mut context = StepContext::new("exec_1");
        let result = StepResult::success("openrouter_video_prompt")
            .with_metadata("extracted_prompt", json!("slow dolly in"));

        record_context(StepType::PromptGeneration, 2, &result, &mut context);
        assert_eq!(context.generated_prompt(), Some("slow dolly in"));
        assert!(!context.contains("step_2_output"));

        let image = StepResult::success("flux_dev").with_url("https://cdn.example.com/a.png");
        record_context(StepType::TextToImage, 1, &image, &mut context);
        assert_eq!(context.get("step_1_output"), Some("https://cdn.example.com/a.png"));
        assert!(!context.contains(IMAGE_ANALYSIS));
    }

    #[test]
    fn test_step_label_counts_enabled_steps() {
        let chain = PipelineChain::new("labels")
            .with_step(step(StepType::TextToImage, "flux_dev"))
            .with_step(step(StepType::PromptGeneration, "openrouter_video_prompt").disabled())
            .with_step(step(StepType::ImageToVideo, "veo3").with_name("Animate"));

        let total = chain.enabled_step_count();
        let labels: Vec<String> = chain
            .enabled_steps()
            .enumerate()
            .map(|(ordinal, (_, step))| step_label(ordinal + 1, total, step))
            .collect();

        assert_eq!(
            labels,
            vec!["Step 1/2: text_to_image (flux_dev)", "Step 2/2: Animate"]
        );
    }
}
