//! Step context for one chain execution
//!
//! Values written here by the runner after a step completes can be read by
//! any later step, which lets non-adjacent steps communicate (e.g. a prompt
//! generation step feeding an image-to-video step two steps later).

use serde::Serialize;
use std::collections::HashMap;

/// Context key written after a prompt generation step
pub const GENERATED_PROMPT: &str = "generated_prompt";

/// Context key written after an image understanding step
pub const IMAGE_ANALYSIS: &str = "image_analysis";

/// Context key written after a speech-to-text step
pub const TRANSCRIPT: &str = "transcript";

/// Runtime context scoped to a single chain run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepContext {
    /// Values contributed by completed steps
    pub values: HashMap<String, String>,

    /// Environment variables available to `${{ env.NAME }}`
    pub env: HashMap<String, String>,

    /// Execution ID of the run this context belongs to
    pub execution_id: String,
}

impl StepContext {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Prompt produced by an upstream prompt generation step, if any
    pub fn generated_prompt(&self) -> Option<&str> {
        self.get(GENERATED_PROMPT)
    }

    pub fn set_env(&mut self, key: &str, value: impl Into<String>) {
        self.env.insert(key.to_string(), value.into());
    }

    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(|v| v.as_str())
    }

    /// Merge environment variables from another source
    pub fn merge_env(&mut self, env: &HashMap<String, String>) {
        for (key, value) in env {
            self.env.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values() {
        let mut ctx = StepContext::new("exec_1");
        assert!(ctx.generated_prompt().is_none());

        ctx.set(GENERATED_PROMPT, "a slow dolly zoom");
        assert_eq!(ctx.generated_prompt(), Some("a slow dolly zoom"));
        assert!(ctx.contains(GENERATED_PROMPT));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_merge_env() {
        let mut ctx = StepContext::new("exec_1");
        ctx.set_env("EXISTING", "value1");

        let mut new_env = HashMap::new();
        new_env.insert("NEW_VAR".to_string(), "value2".to_string());
        new_env.insert("EXISTING".to_string(), "overwritten".to_string());

        ctx.merge_env(&new_env);

        assert_eq!(ctx.get_env("NEW_VAR"), Some("value2"));
        assert_eq!(ctx.get_env("EXISTING"), Some("overwritten"));
    }
}
