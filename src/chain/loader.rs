//! Chain loader
//!
//! Load pipeline chains from YAML files and directories.

use std::path::Path;

use super::PipelineChain;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },
}

pub struct ChainLoader;

impl ChainLoader {
    pub fn from_yaml(yaml: &str) -> Result<PipelineChain, LoadError> {
        serde_yaml::from_str(yaml).map_err(|e| LoadError::Yaml {
            file: "<inline>".to_string(),
            error: e,
        })
    }

    pub fn load_file(path: &Path) -> Result<PipelineChain, LoadError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }

    /// Load every chain file in a directory, sorted by file name
    pub fn load_directory(dir: &Path) -> Result<Vec<PipelineChain>, LoadError> {
        let mut paths = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            // runner.yaml is process configuration, not a chain
            if filename == "runner.yaml" || filename == "runner.yml" {
                continue;
            }

            if ext == Some("yaml") || ext == Some("yml") {
                paths.push(path);
            }
        }

        paths.sort();
        paths.iter().map(|p| Self::load_file(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.yaml");

        fs::write(
            &path,
            r#"
name: single-chain
steps:
  - type: text_to_image
    model: flux_dev
"#,
        )
        .unwrap();

        let chain = ChainLoader::load_file(&path).unwrap();
        assert_eq!(chain.name, "single-chain");
        assert_eq!(chain.steps.len(), 1);
    }

    #[test]
    fn test_load_directory_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.yml"), "name: second\n").unwrap();
        fs::write(dir.path().join("a.yaml"), "name: first\n").unwrap();
        fs::write(dir.path().join("runner.yaml"), "max_cost: 1.0\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let chains = ChainLoader::load_directory(dir.path()).unwrap();
        let names: Vec<_> = chains.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_unknown_step_type_is_a_load_error() {
        let err = ChainLoader::from_yaml(
            r#"
name: bad
steps:
  - type: text_to_hologram
    model: flux_dev
"#,
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::Yaml { .. }));
        assert!(err.to_string().contains("text_to_hologram"));
    }
}
