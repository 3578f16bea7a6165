//! Error types for building and checking pipeline documents

use crate::validate::ValidationReport;
use thiserror::Error;

/// Errors raised while composing a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: &'static str },

    #[error("conflicting definitions for {kind} '{name}'")]
    ConflictingDefinition { kind: &'static str, name: String },

    #[error("deployment chain for '{0}' has no stacks")]
    EmptyChain(String),

    #[error("packer build for '{0}' has no node types")]
    NoNodeTypes(String),

    #[error("pipeline failed validation with {} issue(s)", .0.issues.len())]
    Validation(ValidationReport),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
