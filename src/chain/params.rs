//! Step parameters
//!
//! Steps declare their parameters with named, typed fields. Provider-specific
//! knobs that do not warrant a field go into `extra`.
//!
//! Effective parameters are resolved in one place, highest priority first:
//! 1. `step.params`
//! 2. chain-level `defaults`
//! 3. model defaults from the registry
//! 4. built-in fallbacks for the step type

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use super::step::StepType;

/// Errors for parameter values that can never work
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// A duration given either as a number of seconds or as a label like "8s"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSpec {
    Seconds(f64),
    Label(String),
}

impl DurationSpec {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            DurationSpec::Seconds(secs) => Some(*secs),
            DurationSpec::Label(label) => parse_seconds(label),
        }
    }
}

fn parse_seconds(label: &str) -> Option<f64> {
    label.trim().trim_end_matches('s').trim().parse().ok()
}

/// Parse a merged duration value ("8s", "5", 6) into seconds
pub fn duration_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_seconds(s),
        _ => None,
    }
}

/// Declared parameters for a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Text to speak (text_to_speech) or script for an avatar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_images: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscale_factor: Option<u32>,

    /// Explicit inputs for concat_videos (otherwise the previous output is used)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_paths: Option<Vec<PathBuf>>,

    /// Sound description for add_audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_style: Option<String>,

    /// Provider-specific parameters without a named field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StepParams {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Reject values no provider could accept
    pub fn validate(&self, step_type: StepType) -> Result<(), ParamError> {
        if let Some(duration) = &self.duration {
            match duration.seconds() {
                Some(secs) if secs > 0.0 => {}
                _ => {
                    return Err(ParamError::InvalidDuration(format!(
                        "{:?} for {}",
                        duration, step_type
                    )))
                }
            }
        }

        if let Some(factor) = self.upscale_factor {
            if !(1..=8).contains(&factor) {
                return Err(ParamError::InvalidValue {
                    field: "upscale_factor".to_string(),
                    reason: format!("must be between 1 and 8, got {}", factor),
                });
            }
        }

        if self.num_images == Some(0) {
            return Err(ParamError::InvalidValue {
                field: "num_images".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if let Some(seed) = self.seed {
            if seed < 0 {
                return Err(ParamError::InvalidValue {
                    field: "seed".to_string(),
                    reason: format!("must not be negative, got {}", seed),
                });
            }
        }

        if step_type == StepType::ConcatVideos {
            if let Some(paths) = &self.video_paths {
                if paths.is_empty() {
                    return Err(ParamError::InvalidValue {
                        field: "video_paths".to_string(),
                        reason: "must list at least one video when given".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Named fields and extras as a flat map (unset fields omitted)
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Built-in fallback constants for each step type
pub fn fallback_params(step_type: StepType) -> Map<String, Value> {
    let value = match step_type {
        StepType::TextToImage => json!({
            "aspect_ratio": "16:9",
            "num_images": 1,
            "output_format": "png"
        }),
        StepType::TextToVideo => json!({ "duration": "5", "aspect_ratio": "16:9" }),
        StepType::ImageToImage => json!({ "strength": 0.75 }),
        StepType::ImageToVideo => json!({ "duration": "5" }),
        StepType::TextToSpeech => json!({ "voice": "Rachel", "output_format": "mp3" }),
        StepType::SpeechToText => json!({ "language": "en" }),
        StepType::ImageUnderstanding => json!({ "analysis_type": "description" }),
        StepType::PromptGeneration => json!({ "video_style": "cinematic" }),
        StepType::UpscaleVideo => json!({ "upscale_factor": 2 }),
        StepType::GenerateSubtitles => json!({ "output_format": "srt" }),
        StepType::ConcatVideos => json!({ "output_format": "mp4" }),
        StepType::AddAudio | StepType::Avatar => json!({}),
    };

    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Parameters after the tiered merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedParams(Map<String, Value>);

impl ResolvedParams {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(|v| v.as_u64())
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.0.get("duration").and_then(duration_seconds)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ResolvedParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Merge parameter tiers; later tiers override earlier ones
pub fn resolve_params(
    step_type: StepType,
    step_params: &StepParams,
    chain_defaults: &Map<String, Value>,
    model_defaults: &Map<String, Value>,
) -> ResolvedParams {
    let mut merged = fallback_params(step_type);
    let step_map = step_params.to_map();

    for tier in [model_defaults, chain_defaults, &step_map] {
        for (key, value) in tier {
            if !value.is_null() {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    ResolvedParams(merged)
}
