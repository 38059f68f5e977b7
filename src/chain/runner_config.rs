//! Runner configuration
//!
//! Process-level overrides loaded from runner.yaml and applied to every
//! chain the runner executes:
//!
//! ```yaml
//! output_dir: ./renders
//! max_cost: 10.0
//! save_intermediate_reports: true
//! env:
//!   STYLE: watercolor
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::loader::LoadError;
use super::pipeline::ChainConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub max_cost: Option<f64>,

    #[serde(default)]
    pub save_intermediate_reports: Option<bool>,

    #[serde(default)]
    pub continue_on_failure: Option<bool>,

    /// Variables available to `${{ env.NAME }}` expressions
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl RunnerConfig {
    pub fn load_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }

    /// Overlay the configured values on a chain's own configuration
    pub fn apply_to(&self, config: &mut ChainConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(max_cost) = self.max_cost {
            // The stricter ceiling wins
            config.max_cost = Some(match config.max_cost {
                Some(existing) => existing.min(max_cost),
                None => max_cost,
            });
        }
        if let Some(enabled) = self.save_intermediate_reports {
            config.save_intermediate_reports = enabled;
        }
        if let Some(enabled) = self.continue_on_failure {
            config.continue_on_failure = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_runner_config() {
        let yaml = r#"
output_dir: ./renders
max_cost: 10.0
env:
  STYLE: watercolor
"#;
        let config: RunnerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("./renders")));
        assert_eq!(config.env.get("STYLE"), Some(&"watercolor".to_string()));
        assert!(config.continue_on_failure.is_none());
    }

    #[test]
    fn test_apply_keeps_stricter_cost_ceiling() {
        let runner = RunnerConfig {
            max_cost: Some(10.0),
            ..Default::default()
        };

        let mut config = ChainConfig {
            max_cost: Some(2.5),
            ..Default::default()
        };
        runner.apply_to(&mut config);
        assert_eq!(config.max_cost, Some(2.5));

        let mut config = ChainConfig::default();
        runner.apply_to(&mut config);
        assert_eq!(config.max_cost, Some(10.0));
    }

    #[test]
    fn test_apply_overrides() {
        let runner = RunnerConfig {
            output_dir: Some(PathBuf::from("/srv/out")),
            continue_on_failure: Some(true),
            ..Default::default()
        };
        let mut config = ChainConfig::default();
        runner.apply_to(&mut config);

        assert_eq!(config.output_dir, PathBuf::from("/srv/out"));
        assert!(config.continue_on_failure);
        assert!(!config.save_intermediate_reports);
    }
}
