//! Data handed from one step to the next

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of media flowing between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Text,
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Infer the media kind from a file name or URL extension
    pub fn from_extension(path: &str) -> Option<Self> {
        let path = path.split(&['?', '#'][..]).next().unwrap_or(path);
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" => Some(MediaKind::Image),
            "mp4" | "mov" | "webm" | "mkv" | "avi" => Some(MediaKind::Video),
            "mp3" | "wav" | "m4a" | "flac" | "ogg" | "aac" => Some(MediaKind::Audio),
            "txt" | "md" | "srt" | "vtt" => Some(MediaKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Text => "text",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Input data for a step: the chain's initial input or a previous step's artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepInput {
    Text(String),
    File(PathBuf),
    Url(String),
    Files(Vec<PathBuf>),
}

impl StepInput {
    /// Interpret a command-line style input: URL, existing file, or plain text
    pub fn infer(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            StepInput::Url(raw.to_string())
        } else if Path::new(raw).is_file() {
            StepInput::File(PathBuf::from(raw))
        } else {
            StepInput::Text(raw.to_string())
        }
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            StepInput::Text(_) => Some(MediaKind::Text),
            StepInput::File(path) => path.to_str().and_then(MediaKind::from_extension),
            StepInput::Url(url) => MediaKind::from_extension(url),
            StepInput::Files(_) => Some(MediaKind::Video),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StepInput::Text(text) => Some(text),
            _ => None,
        }
    }

    /// All local paths carried by this input
    pub fn local_paths(&self) -> Vec<PathBuf> {
        match self {
            StepInput::File(path) => vec![path.clone()],
            StepInput::Files(paths) => paths.clone(),
            _ => vec![],
        }
    }
}

impl fmt::Display for StepInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepInput::Text(text) => write!(f, "{}", text),
            StepInput::File(path) => write!(f, "{}", path.display()),
            StepInput::Url(url) => write!(f, "{}", url),
            StepInput::Files(paths) => {
                let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}
