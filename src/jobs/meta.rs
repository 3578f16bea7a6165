//! Self-updating pipelines
//!
//! The meta job renders the pipeline from its configuration inside the
//! build and applies the result with `set_pipeline: self`, so merged
//! configuration changes reach the CI server without a manual `fly` run.

use crate::error::Result;
use crate::model::{
    AnonymousResource, Command, Config, GetStep, Identifier, Input, Job, Output, PipelineFragment,
    Platform, Resource, SetPipelineStep, StepModifiers, TaskConfig, TaskStep,
};
use serde_json::json;

/// Output directory of the render task
const RENDER_OUTPUT: &str = "pipeline";

#[derive(Debug, Clone)]
pub struct MetaPipeline {
    pub pipeline_name: String,

    /// Repository holding the pipeline configuration
    pub code: Resource,

    /// Configuration path relative to the repository root
    pub config_path: String,

    /// Image with the `ol-concourse` binary on its path
    pub image_repository: String,

    pub image_tag: String,
}

impl MetaPipeline {
    pub fn job_name(&self) -> Result<Identifier> {
        Identifier::new(format!("set-{}-pipeline", self.pipeline_name))
    }

    pub fn definition_path(&self) -> String {
        format!("{}/definition.json", RENDER_OUTPUT)
    }

    fn render_task(&self) -> Result<TaskStep> {
        let mut source = Config::new();
        source.insert("repository".to_string(), json!(self.image_repository));
        source.insert("tag".to_string(), json!(self.image_tag));

        let config = TaskConfig {
            platform: Platform::Linux,
            image_resource: Some(AnonymousResource {
                resource_type: Identifier::new("registry-image")?,
                source,
                params: None,
                version: None,
            }),
            run: Command {
                path: "ol-concourse".to_string(),
                args: vec![
                    "render".to_string(),
                    "--file".to_string(),
                    format!("{}/{}", self.code.name, self.config_path),
                    "--output".to_string(),
                    self.definition_path(),
                ],
                dir: None,
                user: None,
            },
            inputs: vec![Input::named(self.code.name.as_str())],
            outputs: vec![Output::named(RENDER_OUTPUT)],
            caches: Vec::new(),
            params: None,
            rootfs_uri: None,
        };

        Ok(TaskStep::inline(
            Identifier::new(format!("render-{}-pipeline", self.pipeline_name))?,
            config,
        ))
    }
}

/// The job that keeps a pipeline in sync with its configuration
pub fn meta_pipeline_job(meta: &MetaPipeline) -> Result<PipelineFragment> {
    let plan = vec![
        GetStep::new(meta.code.name.clone()).trigger(true).into(),
        meta.render_task()?.into(),
        SetPipelineStep {
            set_pipeline: "self".to_string(),
            file: meta.definition_path(),
            vars: None,
            var_files: Vec::new(),
            instance_vars: None,
            team: None,
            modifiers: StepModifiers::default(),
        }
        .into(),
    ];

    Ok(PipelineFragment::new(
        Vec::new(),
        vec![meta.code.clone()],
        vec![Job::new(meta.job_name()?, plan)],
    ))
}
