//! Chain execution engine module
//!
//! This module contains:
//! - `runner` - The chain runner (validation, sequencing, cost ceiling)
//! - `executors` - One executor per step type, behind a dispatch table
//! - `result` - StepResult and the typed StepError
//! - `report` - Execution reports and their persistence
//! - `artifacts` - Downloads of intermediate artifacts
//! - `error` - Chain configuration errors

pub mod artifacts;
pub mod error;
pub mod executors;
pub mod report;
pub mod result;
pub mod runner;

pub use artifacts::{ArtifactDownloader, ArtifactError};
pub use error::ChainError;
pub use executors::{executor_for, StepExecutor};
pub use report::{
    build_execution_report, build_intermediate_report, load_report, save_execution_report,
    save_intermediate_report, CostEntry, ExecutionReport, ReportError, ReportType, RunLog,
    RunStatus, StepRecord,
};
pub use result::{StepError, StepResult};
pub use runner::{ChainRunner, ChainState, CostEstimate};
