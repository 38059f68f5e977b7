//! Execution reports
//!
//! Reports are built as a pure function of the chain and the run log. Saving
//! them is the only side effect, and it lives in the dedicated `save_*`
//! functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::chain::{PipelineChain, PipelineStep, StepType};
use crate::engine::result::{StepError, StepResult};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Run log (report input)
// ============================================================================

/// One executed step with the parameters it ran with
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// 1-based position in the chain
    pub position: usize,
    pub step: PipelineStep,
    pub params: Map<String, Value>,
    pub result: StepResult,
}

/// Everything the runner accumulated during one chain execution
#[derive(Debug, Clone)]
pub struct RunLog {
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    /// Enabled steps in the chain
    pub total_steps: usize,
    pub records: Vec<StepRecord>,
    pub total_cost: f64,
    pub total_time: f64,
    /// First fatal error, surfaced as the run's error
    pub error: Option<StepError>,
}

impl RunLog {
    pub fn new(execution_id: impl Into<String>, total_steps: usize) -> Self {
        Self {
            execution_id: execution_id.into(),
            started_at: Utc::now(),
            total_steps,
            records: vec![],
            total_cost: 0.0,
            total_time: 0.0,
            error: None,
        }
    }

    /// Add a step outcome; totals grow whether or not the step succeeded
    pub fn record(&mut self, record: StepRecord) {
        self.total_cost += record.result.cost;
        self.total_time += record.result.processing_time;
        if let (None, Some(error)) = (&self.error, &record.result.error) {
            self.error = Some(error.clone());
        }
        self.records.push(record);
    }

    pub fn completed_steps(&self) -> usize {
        self.records.iter().filter(|r| r.result.success).count()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.completed_steps() == self.total_steps
    }

    /// Artifacts of successful steps keyed `step_<n>`, plus `final`
    pub fn final_outputs(&self) -> BTreeMap<String, String> {
        let mut outputs = BTreeMap::new();
        let mut last = None;

        for record in self.records.iter().filter(|r| r.result.success) {
            if let Some(artifact) = record.result.primary_artifact() {
                let artifact = artifact.to_string();
                outputs.insert(format!("step_{}", record.position), artifact.clone());
                last = Some(artifact);
            }
        }
        if let Some(last) = last {
            outputs.insert("final".to_string(), last);
        }

        outputs
    }
}

// ============================================================================
// Report types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Final,
    Intermediate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub chain_name: String,
    pub status: RunStatus,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub total_cost: f64,
    pub total_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDetail {
    pub step: usize,
    pub name: String,
    pub step_type: StepType,
    pub model: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    pub cost: f64,
    pub processing_time: f64,
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub step: usize,
    pub step_type: StepType,
    pub model: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub by_step: Vec<CostEntry>,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingEntry {
    pub step: usize,
    pub step_type: StepType,
    pub model: String,
    pub processing_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub by_step: Vec<TimingEntry>,
    pub total_time: f64,
    pub average_step_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub execution_id: String,
    pub report_type: ReportType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_description: Option<String>,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current_step: usize,
    pub total_steps: usize,
}

/// Aggregate view of one chain execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub execution_summary: ExecutionSummary,
    pub step_execution_details: Vec<StepDetail>,
    pub final_outputs: BTreeMap<String, String>,
    pub cost_breakdown: CostBreakdown,
    pub performance_metrics: PerformanceMetrics,
    pub metadata: ReportMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.execution_summary.status == RunStatus::Success
    }

    pub fn execution_id(&self) -> &str {
        &self.metadata.execution_id
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Build the final report for a finished (or aborted) run
pub fn build_execution_report(chain: &PipelineChain, log: &RunLog) -> ExecutionReport {
    let status = if log.is_success() {
        RunStatus::Success
    } else {
        RunStatus::Failed
    };
    build(chain, log, status, ReportType::Final, None)
}

/// Build an in-progress report after `current_step` steps have run
pub fn build_intermediate_report(
    chain: &PipelineChain,
    log: &RunLog,
    current_step: usize,
) -> ExecutionReport {
    let progress = Progress {
        current_step,
        total_steps: log.total_steps,
    };
    build(
        chain,
        log,
        RunStatus::InProgress,
        ReportType::Intermediate,
        Some(progress),
    )
}

fn build(
    chain: &PipelineChain,
    log: &RunLog,
    status: RunStatus,
    report_type: ReportType,
    progress: Option<Progress>,
) -> ExecutionReport {
    let step_execution_details = log.records.iter().map(step_detail).collect();

    let cost_entries = log
        .records
        .iter()
        .map(|r| CostEntry {
            step: r.position,
            step_type: r.step.step_type,
            model: r.result.model.clone(),
            cost: r.result.cost,
        })
        .collect();

    let timing_entries = log
        .records
        .iter()
        .map(|r| TimingEntry {
            step: r.position,
            step_type: r.step.step_type,
            model: r.result.model.clone(),
            processing_time: r.result.processing_time,
        })
        .collect();

    let average_step_time = if log.records.is_empty() {
        0.0
    } else {
        log.total_time / log.records.len() as f64
    };

    ExecutionReport {
        execution_summary: ExecutionSummary {
            chain_name: chain.name.clone(),
            status,
            total_steps: log.total_steps,
            completed_steps: log.completed_steps(),
            total_cost: log.total_cost,
            total_time: log.total_time,
            error: log.error.as_ref().map(|e| e.to_string()),
            error_kind: log.error.as_ref().map(|e| e.kind().to_string()),
        },
        step_execution_details,
        final_outputs: log.final_outputs(),
        cost_breakdown: CostBreakdown {
            by_step: cost_entries,
            total_cost: log.total_cost,
        },
        performance_metrics: PerformanceMetrics {
            by_step: timing_entries,
            total_time: log.total_time,
            average_step_time,
        },
        metadata: ReportMetadata {
            execution_id: log.execution_id.clone(),
            report_type,
            chain_description: chain.description.clone(),
            started_at: log.started_at,
            created_at: Utc::now(),
        },
        progress,
    }
}

fn step_detail(record: &StepRecord) -> StepDetail {
    let result = &record.result;
    StepDetail {
        step: record.position,
        name: record.step.display_name(),
        step_type: record.step.step_type,
        model: result.model.clone(),
        success: result.success,
        output_path: result.output_path.clone(),
        output_url: result.output_url.clone(),
        cost: result.cost,
        processing_time: result.processing_time,
        params: record.params.clone(),
        metadata: result.metadata.clone(),
        error: result.error_message(),
        error_kind: result.error.as_ref().map(|e| e.kind().to_string()),
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Write `reports/<execution_id>_report.json` under `output_dir`
pub fn save_execution_report(
    report: &ExecutionReport,
    output_dir: &Path,
) -> Result<PathBuf, ReportError> {
    let file_name = format!("{}_report.json", report.execution_id());
    write_report(report, output_dir, &file_name)
}

/// Write `reports/<execution_id>_step<N>_intermediate.json` under `output_dir`
pub fn save_intermediate_report(
    report: &ExecutionReport,
    output_dir: &Path,
    step: usize,
) -> Result<PathBuf, ReportError> {
    let file_name = format!("{}_step{}_intermediate.json", report.execution_id(), step);
    write_report(report, output_dir, &file_name)
}

fn write_report(
    report: &ExecutionReport,
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, ReportError> {
    let reports_dir = output_dir.join("reports");
    std::fs::create_dir_all(&reports_dir)?;

    let path = reports_dir.join(file_name);
    std::fs::write(&path, report.to_json_pretty()?)?;
    Ok(path)
}

/// Read a saved report back
pub fn load_report(path: &Path) -> Result<ExecutionReport, ReportError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(position: usize, step_type: StepType, result: StepResult) -> StepRecord {
        StepRecord {
            position,
            step: PipelineStep::new(step_type, result.model.clone()),
            params: Map::new(),
            result,
        }
    }

    fn two_step_log() -> RunLog {
        let mut log = RunLog::new("exec_test", 2);
        log.record(record(
            1,
            StepType::TextToImage,
            StepResult::success("flux_dev")
                .with_url("https://cdn.example.com/a.png")
                .with_cost(0.05)
                .with_time(2.0),
        ));
        log.record(record(
            2,
            StepType::ImageToVideo,
            StepResult::failure("veo3", StepError::Provider("API timeout".into()))
                .with_time(1.0),
        ));
        log
    }

    #[test]
    fn test_failed_report() {
        let chain = PipelineChain::new("demo");
        let report = build_execution_report(&chain, &two_step_log());

        let summary = &report.execution_summary;
        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.completed_steps, 1);
        assert_eq!(summary.total_steps, 2);
        assert_eq!(summary.error.as_deref(), Some("API timeout"));
        assert_eq!(summary.error_kind.as_deref(), Some("provider"));
        assert_eq!(report.performance_metrics.average_step_time, 1.5);
        assert_eq!(report.cost_breakdown.by_step.len(), 2);
        assert_eq!(
            report.final_outputs.get("final").map(String::as_str),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(report.step_execution_details[1].error_kind.as_deref(), Some("provider"));
    }

    #[test]
    fn test_intermediate_report() {
        let chain = PipelineChain::new("demo");
        let mut log = two_step_log();
        log.records.truncate(1);

        let report = build_intermediate_report(&chain, &log, 1);
        assert_eq!(report.execution_summary.status, RunStatus::InProgress);
        assert_eq!(report.metadata.report_type, ReportType::Intermediate);
        assert_eq!(
            report.progress,
            Some(Progress {
                current_step: 1,
                total_steps: 2
            })
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let chain = PipelineChain::new("demo");
        let log = two_step_log();

        let report = build_execution_report(&chain, &log);
        let path = save_execution_report(&report, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("reports").join("exec_test_report.json"));

        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded.execution_summary.completed_steps, 1);
        assert_eq!(loaded.metadata.report_type, ReportType::Final);

        let intermediate = build_intermediate_report(&chain, &log, 1);
        let path = save_intermediate_report(&intermediate, dir.path(), 1).unwrap();
        assert!(path.ends_with("reports/exec_test_step1_intermediate.json"));
    }
}
