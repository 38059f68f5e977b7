//! Registry consistency self-test
//!
//! Not an execution-time gate: the runner never consults this. It exists so
//! that a broken catalog entry is caught by `check-registry` and the tests.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::definition::ModelDefinition;

/// Endpoint prefixes of the providers the catalog may point at
pub const KNOWN_ENDPOINT_PREFIXES: &[&str] = &[
    "fal-ai/",
    "https://fal.run/",
    "https://api.elevenlabs.io/",
    "https://openrouter.ai/api/",
    "https://generativelanguage.googleapis.com/",
    "https://api.openai.com/",
    "local://",
];

static KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_]*$").unwrap());

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryIssue {
    #[error("Duplicate model key: {0}")]
    DuplicateKey(String),

    #[error("Invalid model key '{0}': use lowercase letters, digits and underscores")]
    InvalidKey(String),

    #[error("Model '{0}' has no name")]
    MissingName(String),

    #[error("Model '{0}' has no endpoint")]
    MissingEndpoint(String),

    #[error("Model '{0}' serves no step type")]
    NoCategories(String),

    #[error("Model '{key}' endpoint '{endpoint}' matches no known provider")]
    UnknownEndpoint { key: String, endpoint: String },

    #[error("Model '{0}' has a negative cost estimate")]
    NegativeCost(String),
}

/// Check every definition; returns all problems found
pub fn validate_definitions<'a>(
    definitions: impl IntoIterator<Item = &'a ModelDefinition>,
) -> Vec<RegistryIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for def in definitions {
        if !seen.insert(def.key.as_str()) {
            issues.push(RegistryIssue::DuplicateKey(def.key.clone()));
        }
        if !KEY_REGEX.is_match(&def.key) {
            issues.push(RegistryIssue::InvalidKey(def.key.clone()));
        }
        if def.name.trim().is_empty() {
            issues.push(RegistryIssue::MissingName(def.key.clone()));
        }
        if def.endpoint.trim().is_empty() {
            issues.push(RegistryIssue::MissingEndpoint(def.key.clone()));
        } else if !KNOWN_ENDPOINT_PREFIXES
            .iter()
            .any(|prefix| def.endpoint.starts_with(prefix))
        {
            issues.push(RegistryIssue::UnknownEndpoint {
                key: def.key.clone(),
                endpoint: def.endpoint.clone(),
            });
        }
        if def.categories.is_empty() {
            issues.push(RegistryIssue::NoCategories(def.key.clone()));
        }
        if def.cost_estimate < 0.0 {
            issues.push(RegistryIssue::NegativeCost(def.key.clone()));
        }
    }

    issues
}
