//! Chain configuration errors

use crate::chain::{MediaKind, ParamError, StepType, UnknownStepType};
use crate::registry::RegistryError;

/// Problems found while validating a chain, before anything runs
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("Chain '{0}' has no enabled steps")]
    EmptyChain(String),

    #[error(transparent)]
    UnknownStepType(#[from] UnknownStepType),

    #[error("Step {step}: {error}")]
    Model { step: usize, error: RegistryError },

    #[error("Step {step}: no executor registered for {step_type}")]
    MissingExecutor { step: usize, step_type: StepType },

    #[error("Step {step}: {step_type} cannot consume {input} from the previous step")]
    IncompatibleFlow {
        step: usize,
        step_type: StepType,
        input: MediaKind,
    },

    #[error("Step {step}: {error}")]
    InvalidParams { step: usize, error: ParamError },
}

impl ChainError {
    /// 1-based position of the offending step, if the error is step-specific
    pub fn step(&self) -> Option<usize> {
        match self {
            ChainError::EmptyChain(_) | ChainError::UnknownStepType(_) => None,
            ChainError::Model { step, .. }
            | ChainError::MissingExecutor { step, .. }
            | ChainError::IncompatibleFlow { step, .. }
            | ChainError::InvalidParams { step, .. } => Some(*step),
        }
    }
}
