//! Normalizer for raw provider responses
//!
//! Providers disagree on where the artifact lives (`url`, `video.url`,
//! `images[0].url`, ...) and on field names for cost and timing. Adapters
//! that receive JSON can map it here instead of special-casing each shape.

use serde_json::{Map, Value};
use std::path::PathBuf;

use super::{GeneratedArtifact, GeneratorOutput};

/// Fields consumed by the normalizer; everything else lands in metadata
const KNOWN_FIELDS: &[&str] = &[
    "success",
    "error",
    "output_path",
    "local_path",
    "output_url",
    "url",
    "audio_url",
    "cost_estimate",
    "cost",
    "processing_time",
    "inference_time",
    "model_used",
    "model",
    "metadata",
];

impl GeneratorOutput {
    /// Normalize a provider response into a tagged output
    pub fn from_response(response: &Value, model: &str) -> Self {
        let Some(object) = response.as_object() else {
            return GeneratorOutput::failure(model, format!("Unexpected response: {}", response));
        };

        let error = object.get("error").and_then(error_text);
        let success = object
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(error.is_none());

        let model_used = object
            .get("model_used")
            .or_else(|| object.get("model"))
            .and_then(Value::as_str)
            .unwrap_or(model)
            .to_string();
        let cost_estimate = first_f64(object, &["cost_estimate", "cost"]).unwrap_or(0.0);
        let processing_time =
            first_f64(object, &["processing_time", "inference_time"]).unwrap_or(0.0);

        if !success {
            return GeneratorOutput::Failure {
                error: error.unwrap_or_else(|| "Generation failed".to_string()),
                cost_estimate,
                processing_time,
                model_used,
            };
        }

        let mut metadata = match object.get("metadata") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        for (key, value) in object {
            if !KNOWN_FIELDS.contains(&key.as_str()) && !metadata.contains_key(key) {
                metadata.insert(key.clone(), value.clone());
            }
        }

        GeneratorOutput::Success(GeneratedArtifact {
            output_path: ["output_path", "local_path"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))
                .map(PathBuf::from),
            output_url: output_url(response),
            processing_time,
            cost_estimate,
            model_used,
            metadata,
        })
    }
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

fn first_f64(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| object.get(*key).and_then(Value::as_f64))
}

fn output_url(response: &Value) -> Option<String> {
    const POINTERS: &[&str] = &[
        "/output_url",
        "/url",
        "/video/url",
        "/image/url",
        "/images/0/url",
        "/audio/url",
        "/audio_url",
    ];

    POINTERS
        .iter()
        .find_map(|pointer| response.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact(output: GeneratorOutput) -> GeneratedArtifact {
        match output {
            GeneratorOutput::Success(artifact) => artifact,
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_video_url() {
        let response = json!({
            "video": { "url": "https://cdn.example.com/out.mp4" },
            "cost": 4.0,
            "inference_time": 212.5,
            "seed": 42
        });

        let out = artifact(GeneratorOutput::from_response(&response, "veo3"));
        assert_eq!(out.output_url.as_deref(), Some("https://cdn.example.com/out.mp4"));
        assert_eq!(out.cost_estimate, 4.0);
        assert_eq!(out.processing_time, 212.5);
        assert_eq!(out.model_used, "veo3");
        assert_eq!(out.metadata.get("seed"), Some(&json!(42)));
    }

    #[test]
    fn test_image_list_and_flat_fields() {
        let response = json!({
            "images": [{ "url": "https://cdn.example.com/a.png" }],
            "cost_estimate": 0.025,
            "processing_time": 3.0,
            "model_used": "flux_dev"
        });
        let out = artifact(GeneratorOutput::from_response(&response, "ignored"));
        assert_eq!(out.output_url.as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(out.model_used, "flux_dev");

        let response = json!({ "audio_url": "https://cdn.example.com/a.mp3", "output_path": "/tmp/a.mp3" });
        let out = artifact(GeneratorOutput::from_response(&response, "elevenlabs"));
        assert_eq!(out.output_path, Some(PathBuf::from("/tmp/a.mp3")));
        assert_eq!(out.output_url.as_deref(), Some("https://cdn.example.com/a.mp3"));
    }

    #[test]
    fn test_error_means_failure_unless_flagged() {
        let response = json!({ "success": false, "error": "API timeout", "cost": 0.1 });
        match GeneratorOutput::from_response(&response, "veo3") {
            GeneratorOutput::Failure { error, cost_estimate, .. } => {
                assert_eq!(error, "API timeout");
                assert_eq!(cost_estimate, 0.1);
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let response = json!({ "error": { "message": "rate limited" } });
        assert!(matches!(
            GeneratorOutput::from_response(&response, "m"),
            GeneratorOutput::Failure { ref error, .. } if error == "rate limited"
        ));

        let response = json!({ "error": null, "url": "https://x/y.png" });
        assert!(GeneratorOutput::from_response(&response, "m").is_success());
    }

    #[test]
    fn test_non_object_response() {
        assert!(!GeneratorOutput::from_response(&json!("ok"), "m").is_success());
    }
}
