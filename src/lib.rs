//! ol-concourse - compose CI pipeline definitions from reusable fragments
//!
//! Builders in [`jobs`] return [`model::PipelineFragment`]s that combine
//! into a [`model::Pipeline`], which is checked by [`validate`] and written
//! out as `definition.json`.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod model;
pub mod validate;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use model::{Identifier, Job, Pipeline, PipelineFragment, Resource, ResourceType, Step};
pub use validate::{ValidationIssue, ValidationReport};
