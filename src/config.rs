//! Pipeline configuration from YAML
//!
//! A configuration file describes the resources, image builds and
//! deployments of one application. It is turned into fragments by the
//! builders in [`crate::jobs`] and combined into a single pipeline.

use crate::catalog::{resource_types, resources, GitRepo};
use crate::jobs::{meta_pipeline_job, packer_jobs, pulumi_jobs_chain, MetaPipeline, PackerBuild, PulumiChain};
use crate::model::{
    fly_command, Config, GetStep, Group, Identifier, Pipeline, PipelineFragment, Resource,
    ResourceType, Step,
};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::info;

fn default_fly_target() -> String {
    "pr-inf".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_node_types() -> Vec<String> {
    vec!["server".to_string()]
}

fn default_meta_image() -> String {
    "mitodl/ol-concourse".to_string()
}

fn default_meta_tag() -> String {
    "latest".to_string()
}

/// A resource declared in the configuration, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    Git(GitRepo),
    GithubRelease {
        name: Identifier,
        owner: String,
        repository: String,
        #[serde(default)]
        tag_filter: Option<String>,
    },
    HashicorpRelease {
        name: Identifier,
        project: String,
    },
    AmazonAmi {
        name: Identifier,
        name_pattern: String,
        #[serde(default = "default_region")]
        region: String,
    },
    RegistryImage {
        name: Identifier,
        repository: String,
        #[serde(default)]
        tag: Option<String>,
    },
    Schedule {
        name: Identifier,
        interval: String,
    },
}

impl ResourceSpec {
    pub fn name(&self) -> &Identifier {
        match self {
            ResourceSpec::Git(repo) => &repo.name,
            ResourceSpec::GithubRelease { name, .. }
            | ResourceSpec::HashicorpRelease { name, .. }
            | ResourceSpec::AmazonAmi { name, .. }
            | ResourceSpec::RegistryImage { name, .. }
            | ResourceSpec::Schedule { name, .. } => name,
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self, ResourceSpec::Git(_))
    }

    pub fn to_resource(&self) -> Result<Resource> {
        let resource = match self {
            ResourceSpec::Git(repo) => resources::git_repo(repo)?,
            ResourceSpec::GithubRelease {
                name,
                owner,
                repository,
                tag_filter,
            } => resources::github_release(name.clone(), owner, repository, tag_filter.as_deref())?,
            ResourceSpec::HashicorpRelease { name, project } => {
                resources::hashicorp_release(name.clone(), project)?
            }
            ResourceSpec::AmazonAmi {
                name,
                name_pattern,
                region,
            } => resources::amazon_ami(name.clone(), name_pattern, region)?,
            ResourceSpec::RegistryImage {
                name,
                repository,
                tag,
            } => resources::registry_image(name.clone(), repository, tag.as_deref())?,
            ResourceSpec::Schedule { name, interval } => resources::schedule(name.clone(), interval)?,
        };
        Ok(resource)
    }

    /// The custom resource type this resource needs, if any
    pub fn resource_type(&self) -> Result<Option<ResourceType>> {
        let resource_type = match self {
            ResourceSpec::HashicorpRelease { .. } => Some(resource_types::hashicorp_release()?),
            ResourceSpec::AmazonAmi { .. } => Some(resource_types::amazon_ami()?),
            _ => None,
        };
        Ok(resource_type)
    }
}

/// A packer image built from a template in a git resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub name: String,

    /// Git resource holding the template
    pub code: Identifier,

    pub template_path: String,

    #[serde(default = "default_node_types")]
    pub node_types: Vec<String>,

    #[serde(default)]
    pub vars: Config,

    #[serde(default)]
    pub env_vars_from_files: Config,

    #[serde(default)]
    pub extra_params: Config,

    /// Resources whose new versions trigger a rebuild
    #[serde(default)]
    pub dependencies: Vec<Identifier>,

    #[serde(default)]
    pub job_name_suffix: String,
}

/// A Pulumi project deployed through one stack per environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub project_name: String,

    /// Git resource holding the Pulumi project
    pub code: Identifier,

    pub source_path: String,

    /// Stack names are `<stack_prefix>.<environment>`
    pub stack_prefix: String,

    /// Deployed in this order
    pub environments: Vec<String>,

    /// Image whose build gates the first environment
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<Identifier>,

    /// Extra resources fetched by a single environment
    #[serde(default)]
    pub stage_dependencies: BTreeMap<String, Vec<Identifier>>,

    /// Steps run after the deploy of a single environment
    #[serde(default)]
    pub post_steps: BTreeMap<String, Vec<Step>>,

    #[serde(default)]
    pub env_vars: Config,
}

impl DeploymentConfig {
    pub fn stack_name(&self, environment: &str) -> String {
        format!("{}.{}", self.stack_prefix, environment)
    }

    pub fn stack_names(&self) -> Vec<String> {
        self.environments
            .iter()
            .map(|env| self.stack_name(env))
            .collect()
    }
}

/// Render-and-apply job for keeping the pipeline in sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Git resource holding this configuration file
    pub code: Identifier,

    /// Path of this configuration file inside `code`
    pub config_path: String,

    #[serde(default = "default_meta_image")]
    pub image: String,

    #[serde(default = "default_meta_tag")]
    pub tag: String,
}

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name passed to `fly set-pipeline -p`
    pub name: String,

    #[serde(default = "default_fly_target")]
    pub fly_target: String,

    #[serde(default)]
    pub team: Option<String>,

    /// Generate one group per image, deployment and the meta job
    #[serde(default)]
    pub groups: bool,

    #[serde(default)]
    pub resources: Vec<ResourceSpec>,

    #[serde(default)]
    pub images: Vec<ImageConfig>,

    #[serde(default)]
    pub deployments: Vec<DeploymentConfig>,

    #[serde(default)]
    pub meta: Option<MetaConfig>,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        Identifier::new(self.name.as_str()).context("Invalid pipeline name")?;

        // Check that all resource names are unique
        let mut declared: HashMap<&Identifier, &ResourceSpec> = HashMap::new();
        for spec in &self.resources {
            if declared.insert(spec.name(), spec).is_some() {
                anyhow::bail!("Duplicate resource: {}", spec.name());
            }
        }

        let require_git = |owner: &str, code: &Identifier| -> Result<()> {
            match declared.get(code) {
                None => anyhow::bail!("{} references non-existent resource '{}'", owner, code),
                Some(spec) if !spec.is_git() => {
                    anyhow::bail!("{} code resource '{}' is not a git resource", owner, code)
                }
                Some(_) => Ok(()),
            }
        };
        let require_declared = |owner: &str, names: &[Identifier]| -> Result<()> {
            for name in names {
                if !declared.contains_key(name) {
                    anyhow::bail!("{} depends on non-existent resource '{}'", owner, name);
                }
            }
            Ok(())
        };

        let mut image_names = HashSet::new();
        for image in &self.images {
            let owner = format!("Image '{}'", image.name);
            if !image_names.insert(image.name.as_str()) {
                anyhow::bail!("Duplicate image: {}", image.name);
            }
            if image.node_types.is_empty() {
                anyhow::bail!("{} has no node types", owner);
            }
            require_git(&owner, &image.code)?;
            require_declared(&owner, &image.dependencies)?;
        }

        let mut project_names = HashSet::new();
        for deployment in &self.deployments {
            let owner = format!("Deployment '{}'", deployment.project_name);
            if !project_names.insert(deployment.project_name.as_str()) {
                anyhow::bail!("Duplicate deployment: {}", deployment.project_name);
            }
            if deployment.environments.is_empty() {
                anyhow::bail!("{} has no environments", owner);
            }
            let mut environments = HashSet::new();
            for env in &deployment.environments {
                if !environments.insert(env.as_str()) {
                    anyhow::bail!("{} lists environment '{}' twice", owner, env);
                }
            }
            require_git(&owner, &deployment.code)?;
            require_declared(&owner, &deployment.dependencies)?;
            for (env, names) in &deployment.stage_dependencies {
                if !environments.contains(env.as_str()) {
                    anyhow::bail!("{} has stage dependencies for unknown environment '{}'", owner, env);
                }
                require_declared(&owner, names)?;
            }
            for env in deployment.post_steps.keys() {
                if !environments.contains(env.as_str()) {
                    anyhow::bail!("{} has post steps for unknown environment '{}'", owner, env);
                }
            }
            if let Some(image) = &deployment.image {
                if !image_names.contains(image.as_str()) {
                    anyhow::bail!("{} is gated on non-existent image '{}'", owner, image);
                }
            }
        }

        if let Some(meta) = &self.meta {
            require_git("Meta job", &meta.code)?;
        }

        Ok(())
    }

    fn resource(&self, name: &Identifier) -> Result<Resource> {
        self.resources
            .iter()
            .find(|spec| spec.name() == name)
            .ok_or_else(|| anyhow!("Resource '{}' is not declared", name))?
            .to_resource()
    }

    fn gets(names: &[Identifier]) -> Vec<GetStep> {
        names
            .iter()
            .map(|name| GetStep::new(name.clone()).trigger(true))
            .collect()
    }

    fn packer_build(&self, image: &ImageConfig) -> Result<PackerBuild> {
        let mut build = PackerBuild::new(
            image.name.as_str(),
            self.resource(&image.code)?,
            image.template_path.as_str(),
        );
        build.node_types = image.node_types.clone();
        build.dependencies = Self::gets(&image.dependencies);
        build.packer_vars = image.vars.clone();
        build.env_vars_from_files = image.env_vars_from_files.clone();
        build.extra_params = image.extra_params.clone();
        build.job_name_suffix = image.job_name_suffix.clone();
        Ok(build)
    }

    fn pulumi_chain(&self, deployment: &DeploymentConfig) -> Result<PulumiChain> {
        let mut chain = PulumiChain::new(
            deployment.project_name.as_str(),
            deployment.source_path.as_str(),
            self.resource(&deployment.code)?,
            deployment.stack_names(),
        );
        chain.dependencies = Self::gets(&deployment.dependencies);
        chain.env_vars = deployment.env_vars.clone();

        if let Some(image_name) = &deployment.image {
            let image = self
                .images
                .iter()
                .find(|image| &image.name == image_name)
                .ok_or_else(|| anyhow!("Image '{}' is not declared", image_name))?;
            let build_job = self.packer_build(image)?.build_job_name()?;
            chain
                .dependencies
                .push(GetStep::new(image.code.clone()).trigger(true).passed(vec![build_job]));
        }

        for (env, names) in &deployment.stage_dependencies {
            chain
                .custom_dependencies
                .insert(deployment.stack_name(env), Self::gets(names));
        }
        for (env, steps) in &deployment.post_steps {
            chain
                .additional_post_steps
                .insert(deployment.stack_name(env), steps.clone());
        }
        Ok(chain)
    }

    fn meta_pipeline(&self, meta: &MetaConfig) -> Result<MetaPipeline> {
        Ok(MetaPipeline {
            pipeline_name: self.name.clone(),
            code: self.resource(&meta.code)?,
            config_path: meta.config_path.clone(),
            image_repository: meta.image.clone(),
            image_tag: meta.tag.clone(),
        })
    }

    /// Build every fragment described by the configuration, in document order
    pub fn fragments(&self) -> Result<Vec<PipelineFragment>> {
        let mut fragments = Vec::new();

        let mut declared_types = Vec::new();
        let mut declared_resources = Vec::new();
        for spec in &self.resources {
            declared_resources.push(spec.to_resource()?);
            declared_types.extend(spec.resource_type()?);
        }
        fragments.push(PipelineFragment::new(declared_types, declared_resources, Vec::new()));

        if let Some(meta) = &self.meta {
            fragments.push(meta_pipeline_job(&self.meta_pipeline(meta)?)?);
        }
        for image in &self.images {
            fragments.push(packer_jobs(&self.packer_build(image)?)?);
        }
        for deployment in &self.deployments {
            fragments.push(pulumi_jobs_chain(&self.pulumi_chain(deployment)?)?);
        }

        Ok(fragments)
    }

    fn groups(&self, fragments: &[PipelineFragment]) -> Result<Vec<Group>> {
        let job_names = |fragment: &PipelineFragment| -> Vec<String> {
            fragment.jobs.iter().map(|job| job.name.to_string()).collect()
        };

        // Fragment order matches `fragments()`: resources, meta, images, deployments
        let mut remaining = fragments.iter().skip(1);
        let mut groups = Vec::new();
        if self.meta.is_some() {
            if let Some(fragment) = remaining.next() {
                groups.push(Group {
                    name: Identifier::new("meta")?,
                    jobs: job_names(fragment),
                });
            }
        }
        for (image, fragment) in self.images.iter().zip(remaining.by_ref()) {
            groups.push(Group {
                name: Identifier::new(format!("{}-image", image.name))?,
                jobs: job_names(fragment),
            });
        }
        for (deployment, fragment) in self.deployments.iter().zip(remaining) {
            groups.push(Group {
                name: Identifier::new(deployment.project_name.as_str())?,
                jobs: job_names(fragment),
            });
        }
        Ok(groups)
    }

    /// Build, combine and check the complete pipeline
    pub fn to_pipeline(&self) -> Result<Pipeline> {
        let fragments = self.fragments()?;
        let groups = if self.groups {
            self.groups(&fragments)?
        } else {
            Vec::new()
        };

        let pipeline = PipelineFragment::combine(fragments)
            .context("Failed to combine pipeline fragments")?
            .to_pipeline()
            .with_groups(groups);
        pipeline.validate().context("Generated pipeline is invalid")?;

        info!(
            "Rendered pipeline {} with {} jobs",
            self.name,
            pipeline.jobs.len()
        );
        Ok(pipeline)
    }

    /// The `fly` invocation that applies a rendered definition
    pub fn fly_command(&self, definition: &str) -> String {
        fly_command(&self.fly_target, &self.name, definition, self.team.as_deref())
    }
}
