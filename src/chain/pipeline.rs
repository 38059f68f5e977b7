//! Pipeline chain definition
//!
//! A chain is an ordered list of steps plus chain-level configuration. Step
//! order is execution order and is never changed by the runner.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::step::PipelineStep;

/// A complete pipeline chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineChain {
    /// Chain name (required)
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<PipelineStep>,

    /// Chain-level configuration (declared at the top level of the YAML)
    #[serde(flatten)]
    pub config: ChainConfig,
}

impl PipelineChain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: vec![],
            config: ChainConfig::default(),
        }
    }

    pub fn with_step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Steps that will actually run, with their 1-based position in the chain
    pub fn enabled_steps(&self) -> impl Iterator<Item = (usize, &PipelineStep)> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.enabled)
            .map(|(idx, step)| (idx + 1, step))
    }

    pub fn enabled_step_count(&self) -> usize {
        self.steps.iter().filter(|s| s.enabled).count()
    }
}

/// Chain-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Where reports and downloaded intermediates are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Scratch directory for local processing
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Remove `temp_dir` after the run
    #[serde(default = "default_true")]
    pub cleanup_temp: bool,

    /// Download remote step outputs into `<output_dir>/intermediates/`
    #[serde(default)]
    pub save_intermediates: bool,

    /// Persist an intermediate report after every completed step
    #[serde(default)]
    pub save_intermediate_reports: bool,

    /// Persist the final execution report
    #[serde(default = "default_true")]
    pub save_reports: bool,

    /// Abort before a step whose estimated cost would push the total past this (USD)
    #[serde(default)]
    pub max_cost: Option<f64>,

    /// Keep executing after a failed step (opt-in; the run is still reported as failed)
    #[serde(default)]
    pub continue_on_failure: bool,

    /// Chain-level parameter defaults, below step params and above model defaults
    #[serde(default)]
    pub defaults: Map<String, Value>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_true() -> bool {
    true
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            cleanup_temp: true,
            save_intermediates: false,
            save_intermediate_reports: false,
            save_reports: true,
            max_cost: None,
            continue_on_failure: false,
            defaults: Map::new(),
        }
    }
}

impl ChainConfig {
    pub fn reports_dir(&self) -> PathBuf {
        self.output_dir.join("reports")
    }

    pub fn intermediates_dir(&self) -> PathBuf {
        self.output_dir.join("intermediates")
    }
}
