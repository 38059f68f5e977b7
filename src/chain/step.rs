//! Step types and step definitions
//!
//! A step is one declarative unit of work: what kind of generation to run,
//! which registered model to run it with, and the parameters to pass.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::input::MediaKind;
use super::params::StepParams;

// ============================================================================
// StepType
// ============================================================================

/// Closed set of generation operations a pipeline step can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    TextToImage,
    TextToVideo,
    ImageUnderstanding,
    PromptGeneration,
    ImageToImage,
    ImageToVideo,
    TextToSpeech,
    SpeechToText,
    AddAudio,
    UpscaleVideo,
    GenerateSubtitles,
    Avatar,
    ConcatVideos,
}

/// Raised when a step type string does not name a known step type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown step type: {0}")]
pub struct UnknownStepType(pub String);

impl StepType {
    pub const ALL: [StepType; 13] = [
        StepType::TextToImage,
        StepType::TextToVideo,
        StepType::ImageUnderstanding,
        StepType::PromptGeneration,
        StepType::ImageToImage,
        StepType::ImageToVideo,
        StepType::TextToSpeech,
        StepType::SpeechToText,
        StepType::AddAudio,
        StepType::UpscaleVideo,
        StepType::GenerateSubtitles,
        StepType::Avatar,
        StepType::ConcatVideos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::TextToImage => "text_to_image",
            StepType::TextToVideo => "text_to_video",
            StepType::ImageUnderstanding => "image_understanding",
            StepType::PromptGeneration => "prompt_generation",
            StepType::ImageToImage => "image_to_image",
            StepType::ImageToVideo => "image_to_video",
            StepType::TextToSpeech => "text_to_speech",
            StepType::SpeechToText => "speech_to_text",
            StepType::AddAudio => "add_audio",
            StepType::UpscaleVideo => "upscale_video",
            StepType::GenerateSubtitles => "generate_subtitles",
            StepType::Avatar => "avatar",
            StepType::ConcatVideos => "concat_videos",
        }
    }

    /// Media kinds this step can consume from the previous step
    pub fn accepted_inputs(&self) -> &'static [MediaKind] {
        match self {
            StepType::TextToImage | StepType::TextToVideo | StepType::TextToSpeech => {
                &[MediaKind::Text]
            }
            StepType::ImageUnderstanding
            | StepType::PromptGeneration
            | StepType::ImageToImage
            | StepType::ImageToVideo
            | StepType::Avatar => &[MediaKind::Image],
            StepType::SpeechToText => &[MediaKind::Audio, MediaKind::Video],
            StepType::AddAudio
            | StepType::UpscaleVideo
            | StepType::GenerateSubtitles
            | StepType::ConcatVideos => &[MediaKind::Video],
        }
    }

    /// Media kind handed to the next step, given what this step consumed
    pub fn output_kind(&self, input: MediaKind) -> MediaKind {
        match self {
            StepType::TextToImage | StepType::ImageToImage => MediaKind::Image,
            StepType::TextToVideo
            | StepType::ImageToVideo
            | StepType::Avatar
            | StepType::AddAudio
            | StepType::UpscaleVideo
            | StepType::GenerateSubtitles
            | StepType::ConcatVideos => MediaKind::Video,
            StepType::TextToSpeech => MediaKind::Audio,
            StepType::SpeechToText => MediaKind::Text,
            // Analysis steps leave their input in place for the next step
            StepType::ImageUnderstanding | StepType::PromptGeneration => input,
        }
    }

    /// Steps processed on this machine without a paid API call
    pub fn is_local(&self) -> bool {
        matches!(self, StepType::ConcatVideos | StepType::GenerateSubtitles)
    }

    /// Steps that modify a video file produced earlier in the chain
    pub fn requires_local_file(&self) -> bool {
        matches!(
            self,
            StepType::AddAudio | StepType::UpscaleVideo | StepType::GenerateSubtitles
        )
    }

    /// Image-to-X steps that prefer an upstream generated prompt
    pub fn prefers_generated_prompt(&self) -> bool {
        matches!(
            self,
            StepType::ImageToImage | StepType::ImageToVideo | StepType::Avatar
        )
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = UnknownStepType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownStepType(s.to_string()))
    }
}

// ============================================================================
// PipelineStep
// ============================================================================

/// A single step in a pipeline chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Step type (e.g., "text_to_image", "image_to_video")
    #[serde(rename = "type")]
    pub step_type: StepType,

    /// Model key resolved through the model registry
    pub model: String,

    /// Step parameters
    #[serde(default)]
    pub params: StepParams,

    /// Disabled steps are skipped entirely
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Display name (for logging)
    #[serde(default)]
    pub name: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl PipelineStep {
    pub fn new(step_type: StepType, model: impl Into<String>) -> Self {
        Self {
            step_type,
            model: model.into(),
            params: StepParams::default(),
            enabled: true,
            name: None,
        }
    }

    /// Build a step from a step type string, rejecting unknown types up front
    pub fn parse(step_type: &str, model: impl Into<String>) -> Result<Self, UnknownStepType> {
        Ok(Self::new(step_type.parse()?, model))
    }

    pub fn with_params(mut self, params: StepParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} ({})", self.step_type, self.model))
    }
}
