//! Scenario tests for composing complete pipelines

mod helpers;

mod fragment_merge;
mod image_to_deploy;
mod integrity;
mod render_config;
