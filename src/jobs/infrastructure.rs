//! Image builds and stack deployments
//!
//! `packer_jobs` validates then builds machine images; `pulumi_jobs_chain`
//! deploys one Pulumi project through a sequence of stacks, each stage
//! gated on the one before it.

use crate::catalog::{resource_types, resources};
use crate::error::{PipelineError, Result};
use crate::model::{
    Config, GetStep, Identifier, InParallelStep, Job, PipelineFragment, PutStep, Resource, Step,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default region passed to Pulumi deployments
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Inputs for the packer validate/build job pair of one image
#[derive(Debug, Clone)]
pub struct PackerBuild {
    /// Short image name used in job names (`tika` -> `build-tika-ami`)
    pub name: String,

    /// Repository holding the packer template
    pub image_code: Resource,

    /// Template path relative to the repository root
    pub template_path: String,

    /// One build source per node type (`amazon-ebs.<node_type>`)
    pub node_types: Vec<String>,

    /// Extra gets that trigger a rebuild
    pub dependencies: Vec<GetStep>,

    pub packer_vars: Config,

    pub env_vars_from_files: Config,

    /// Merged into the put params of every node type
    pub extra_params: Config,

    pub job_name_suffix: String,
}

impl PackerBuild {
    pub fn new(name: impl Into<String>, image_code: Resource, template_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_code,
            template_path: template_path.into(),
            node_types: vec!["server".to_string()],
            dependencies: Vec::new(),
            packer_vars: Config::new(),
            env_vars_from_files: Config::new(),
            extra_params: Config::new(),
            job_name_suffix: String::new(),
        }
    }

    pub fn validate_job_name(&self) -> Result<Identifier> {
        Identifier::new(format!("validate-{}-packer{}", self.name, self.job_name_suffix))
    }

    pub fn build_job_name(&self) -> Result<Identifier> {
        Identifier::new(format!("build-{}-ami{}", self.name, self.job_name_suffix))
    }

    fn put_params(&self, node_type: &str, objective: &str) -> Config {
        let mut vars = Config::new();
        vars.insert("node_type".to_string(), json!(node_type));
        vars.extend(self.packer_vars.clone());

        let mut params = Config::new();
        params.insert(
            "template".to_string(),
            json!(format!("{}/{}", self.image_code.name, self.template_path)),
        );
        params.insert("objective".to_string(), json!(objective));
        params.insert("only".to_string(), json!([format!("amazon-ebs.{}", node_type)]));
        params.insert("vars".to_string(), Value::Object(vars));
        if !self.env_vars_from_files.is_empty() {
            params.insert(
                "env_vars_from_files".to_string(),
                Value::Object(self.env_vars_from_files.clone()),
            );
        }
        params.extend(self.extra_params.clone());
        params
    }

    fn packer_puts(&self, target: &Resource, objective: &str) -> Step {
        let puts = self
            .node_types
            .iter()
            .map(|node_type| -> Step {
                PutStep::new(target.name.clone())
                    .params(self.put_params(node_type, objective))
                    .no_get(true)
                    .into()
            })
            .collect();
        InParallelStep::new(puts).into()
    }
}

/// Validate then build an image, one put per node type
pub fn packer_jobs(build: &PackerBuild) -> Result<PipelineFragment> {
    if build.node_types.is_empty() {
        return Err(PipelineError::NoNodeTypes(build.name.clone()));
    }

    let validate_resource = resources::packer_validate()?;
    let build_resource = resources::packer_build()?;
    let validate_name = build.validate_job_name()?;
    let build_name = build.build_job_name()?;

    let gets = fold_gets(
        build
            .dependencies
            .iter()
            .cloned()
            .chain([GetStep::new(build.image_code.name.clone())]),
    );

    let mut validate_plan: Vec<Step> = gets
        .iter()
        .map(|get| -> Step { get.clone().trigger(true).into() })
        .collect();
    validate_plan.push(build.packer_puts(&validate_resource, "validate"));

    let mut build_plan: Vec<Step> = gets
        .iter()
        .map(|get| -> Step {
            get.clone()
                .trigger(true)
                .passed(vec![validate_name.clone()])
                .into()
        })
        .collect();
    build_plan.push(build.packer_puts(&build_resource, "build"));

    debug!(
        "Built packer jobs {} and {} for {} node type(s)",
        validate_name,
        build_name,
        build.node_types.len()
    );

    Ok(PipelineFragment::new(
        vec![resource_types::packer()?],
        vec![build.image_code.clone(), validate_resource, build_resource],
        vec![
            Job::new(validate_name, validate_plan),
            Job::new(build_name, build_plan),
        ],
    ))
}

/// Merge gets of the same artifact into the first one
///
/// A job may get each name only once; the merged get triggers if any of
/// them did and keeps every `passed` entry.
fn fold_gets(steps: impl IntoIterator<Item = GetStep>) -> Vec<GetStep> {
    let mut folded: Vec<GetStep> = Vec::new();
    for step in steps {
        match folded.iter_mut().find(|existing| existing.get == step.get) {
            Some(existing) => {
                debug!("Folding repeated get of {}", step.get);
                existing.trigger |= step.trigger;
                for job in step.passed {
                    if !existing.passed.contains(&job) {
                        existing.passed.push(job);
                    }
                }
            }
            None => folded.push(step),
        }
    }
    folded
}

/// Production stacks are deployed by hand
pub fn is_production_stack(stack_name: &str) -> bool {
    stack_name
        .rsplit('.')
        .next()
        .is_some_and(|env| env.eq_ignore_ascii_case("production"))
}

/// Job name for deploying one stack of a project
pub fn deploy_job_name(project_name: &str, stack_name: &str) -> Result<Identifier> {
    Identifier::new(format!(
        "deploy-{}-{}",
        project_name,
        stack_name.to_lowercase()
    ))
}

/// One stage of a deployment chain
#[derive(Debug, Clone)]
pub struct PulumiStage<'a> {
    pub project_name: &'a str,
    pub project_source_path: &'a str,
    pub pulumi_code: &'a Resource,
    pub provisioner: &'a Resource,
    pub stack_name: &'a str,
    pub dependencies: &'a [GetStep],

    /// Gets fetched by this stage only; never gated on the previous job
    pub stage_dependencies: &'a [GetStep],
    pub previous_job: Option<&'a Identifier>,
    pub env_vars: &'a Config,
    pub post_steps: &'a [Step],
}

/// Deploy a single stack
///
/// With a previous job every get is gated on it; without one the
/// dependencies keep whatever `passed` they were given.
pub fn pulumi_job(stage: &PulumiStage<'_>) -> Result<Job> {
    let trigger = !is_production_stack(stage.stack_name);
    if !trigger {
        warn!(
            "Stack {} is a production stack and must be deployed manually",
            stage.stack_name
        );
    }

    let gate = |step: GetStep| -> Step {
        let step = step.trigger(trigger);
        match stage.previous_job {
            Some(previous) => step.passed(vec![previous.clone()]).into(),
            None => step.into(),
        }
    };

    // A dependency on the code resource itself is folded into the code get
    let gets = fold_gets(
        [GetStep::new(stage.pulumi_code.name.clone())]
            .into_iter()
            .chain(stage.dependencies.iter().cloned()),
    );
    let mut plan: Vec<Step> = gets.into_iter().map(gate).collect();
    plan.extend(
        stage
            .stage_dependencies
            .iter()
            .map(|step| -> Step { step.clone().trigger(trigger).into() }),
    );

    let mut env_os = Config::new();
    env_os.insert("AWS_DEFAULT_REGION".to_string(), json!(DEFAULT_AWS_REGION));
    env_os.insert(
        "PYTHONPATH".to_string(),
        json!(format!("/usr/lib/:/tmp/build/put/{}/src/", stage.pulumi_code.name)),
    );
    env_os.extend(stage.env_vars.clone());

    let mut params = Config::new();
    params.insert("action".to_string(), json!("update"));
    params.insert("stack_name".to_string(), json!(stage.stack_name));
    params.insert(
        "source_dir".to_string(),
        json!(format!("{}/{}", stage.pulumi_code.name, stage.project_source_path)),
    );
    params.insert("env_os".to_string(), Value::Object(env_os));

    plan.push(PutStep::new(stage.provisioner.name.clone()).params(params).into());
    plan.extend(stage.post_steps.iter().cloned());

    let name = deploy_job_name(stage.project_name, stage.stack_name)?;
    debug!("Built deploy job {}", name);
    Ok(Job::new(name, plan))
}

/// Inputs for deploying a project through an ordered list of stacks
#[derive(Debug, Clone)]
pub struct PulumiChain {
    pub project_name: String,

    /// Project directory relative to the code repository root
    pub project_source_path: String,

    pub pulumi_code: Resource,

    /// Deployed in order; each stage is gated on the previous one
    pub stack_names: Vec<String>,

    /// Gets added to every stage
    pub dependencies: Vec<GetStep>,

    /// Extra gets for a single stage, keyed by stack name
    pub custom_dependencies: BTreeMap<String, Vec<GetStep>>,

    /// Steps run after the deploy, keyed by stack name
    pub additional_post_steps: BTreeMap<String, Vec<Step>>,

    /// Extra environment passed to the Pulumi process
    pub env_vars: Config,
}

impl PulumiChain {
    pub fn new(
        project_name: impl Into<String>,
        project_source_path: impl Into<String>,
        pulumi_code: Resource,
        stack_names: Vec<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            project_source_path: project_source_path.into(),
            pulumi_code,
            stack_names,
            dependencies: Vec::new(),
            custom_dependencies: BTreeMap::new(),
            additional_post_steps: BTreeMap::new(),
            env_vars: Config::new(),
        }
    }
}

/// Build one deploy job per stack, chained with `passed` constraints
pub fn pulumi_jobs_chain(chain: &PulumiChain) -> Result<PipelineFragment> {
    if chain.stack_names.is_empty() {
        return Err(PipelineError::EmptyChain(chain.project_name.clone()));
    }

    let provisioner =
        resources::pulumi_provisioner(&chain.project_name, &chain.project_source_path)?;

    let mut jobs: Vec<Job> = Vec::with_capacity(chain.stack_names.len());
    for stack_name in &chain.stack_names {
        let stage_dependencies = chain
            .custom_dependencies
            .get(stack_name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let post_steps = chain
            .additional_post_steps
            .get(stack_name)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let job = pulumi_job(&PulumiStage {
            project_name: &chain.project_name,
            project_source_path: &chain.project_source_path,
            pulumi_code: &chain.pulumi_code,
            provisioner: &provisioner,
            stack_name,
            dependencies: &chain.dependencies,
            stage_dependencies,
            previous_job: jobs.last().map(|job| &job.name),
            env_vars: &chain.env_vars,
            post_steps,
        })?;
        jobs.push(job);
    }

    Ok(PipelineFragment::new(
        vec![resource_types::pulumi_provisioner()?],
        vec![chain.pulumi_code.clone(), provisioner],
        jobs,
    ))
}
