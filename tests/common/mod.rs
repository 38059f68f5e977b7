#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ai_content_pipeline::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_chain(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).expect("Failed to write chain file");
    path
}

/// Create an empty file that stands in for a generated video
pub fn touch_video(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").expect("Failed to write video file");
    path
}

/// Chain config that keeps every file inside `dir`
pub fn config_in(dir: &Path) -> ChainConfig {
    ChainConfig {
        output_dir: dir.join("output"),
        temp_dir: dir.join("temp"),
        ..Default::default()
    }
}

pub fn registry() -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::with_builtin_models())
}

/// text_to_image(flux_dev) -> image_to_video(veo3)
pub fn image_to_video_chain(dir: &Path) -> PipelineChain {
    PipelineChain::new("image-to-video")
        .with_config(config_in(dir))
        .with_step(
            PipelineStep::new(StepType::TextToImage, "flux_dev")
                .with_params(StepParams::default().with_prompt("a lighthouse at dawn")),
        )
        .with_step(PipelineStep::new(StepType::ImageToVideo, "veo3"))
}

/// Generator returning a fixed response and recording every request
pub struct MockGenerator {
    response: Value,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(vec![]),
        })
    }

    pub fn succeeding(url: &str, cost: f64) -> Arc<Self> {
        Self::new(json!({ "success": true, "output_url": url, "cost": cost, "processing_time": 1.5 }))
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Self::new(json!({ "success": false, "error": error }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratorOutput, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok(GeneratorOutput::from_response(&self.response, &request.model))
    }
}

/// Generator that raises instead of returning an output
pub struct ErroringGenerator;

#[async_trait]
impl Generator for ErroringGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratorOutput, GeneratorError> {
        Err(GeneratorError::RateLimited("429 Too Many Requests".to_string()))
    }
}

/// Generator that panics mid-call
pub struct PanickingGenerator;

#[async_trait]
impl Generator for PanickingGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratorOutput, GeneratorError> {
        panic!("provider adapter bug")
    }
}
