//! Step result types

use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::chain::StepInput;

/// Why a step failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    /// Unknown model, model/category mismatch, bad expression
    #[error("{0}")]
    Configuration(String),

    /// Required artifact from an earlier step is absent or not on disk
    #[error("{0}")]
    MissingInput(String),

    /// The collaborator reported or raised a failure
    #[error("{0}")]
    Provider(String),

    #[error("Cost limit exceeded: projected ${projected:.4} exceeds limit ${limit:.4}")]
    CostLimitExceeded { projected: f64, limit: f64 },

    /// Failure inside the executor itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StepError {
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Configuration(_) => "configuration",
            StepError::MissingInput(_) => "missing_input",
            StepError::Provider(_) => "provider",
            StepError::CostLimitExceeded { .. } => "cost_limit_exceeded",
            StepError::Internal(_) => "internal",
        }
    }
}

/// Normalized outcome of one executor invocation
///
/// `error` is set exactly when `success` is false; use the constructors to
/// keep the two in step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub output_url: Option<String>,
    /// Seconds
    pub processing_time: f64,
    /// USD
    pub cost: f64,
    /// Model key actually used
    pub model: String,
    pub metadata: Map<String, Value>,
    pub error: Option<StepError>,
}

impl StepResult {
    pub fn success(model: impl Into<String>) -> Self {
        Self {
            success: true,
            output_path: None,
            output_url: None,
            processing_time: 0.0,
            cost: 0.0,
            model: model.into(),
            metadata: Map::new(),
            error: None,
        }
    }

    pub fn failure(model: impl Into<String>, error: StepError) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::success(model)
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.output_url = Some(url.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost.max(0.0);
        self
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.processing_time = seconds.max(0.0);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Local copy recorded after an intermediate download
    pub fn local_copy(&self) -> Option<PathBuf> {
        self.metadata
            .get("local_path")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    /// Artifact to hand to the next step: local file first, then remote URL
    pub fn primary_artifact(&self) -> Option<StepInput> {
        self.output_path
            .clone()
            .or_else(|| self.local_copy())
            .map(StepInput::File)
            .or_else(|| self.output_url.clone().map(StepInput::Url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_carries_error() {
        let result = StepResult::failure("veo3", StepError::Provider("API timeout".into()));
        assert!(!result.success);
        assert_eq!(result.error_message().as_deref(), Some("API timeout"));
        assert_eq!(result.error.as_ref().map(|e| e.kind()), Some("provider"));

        let ok = StepResult::success("flux_dev");
        assert!(ok.success && ok.error.is_none());
    }

    #[test]
    fn test_primary_artifact_prefers_local() {
        let result = StepResult::success("flux_dev")
            .with_url("https://cdn.example.com/a.png")
            .with_metadata("local_path", json!("/out/intermediates/a.png"));
        assert_eq!(
            result.primary_artifact(),
            Some(StepInput::File(PathBuf::from("/out/intermediates/a.png")))
        );

        let remote = StepResult::success("flux_dev").with_url("https://cdn.example.com/a.png");
        assert_eq!(
            remote.primary_artifact(),
            Some(StepInput::Url("https://cdn.example.com/a.png".into()))
        );
        assert_eq!(StepResult::success("m").primary_artifact(), None);
    }

    #[test]
    fn test_cost_limit_message() {
        let err = StepError::CostLimitExceeded {
            projected: 6.5,
            limit: 5.0,
        };
        assert!(err.to_string().starts_with("Cost limit exceeded"));
        assert_eq!(err.kind(), "cost_limit_exceeded");
    }
}
