//! Constructors for the resources pipelines are assembled from

use crate::catalog::resource_types;
use crate::error::Result;
use crate::model::{Config, Identifier, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn source<const N: usize>(entries: [(&str, Value); N]) -> Config {
    entries
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn default_branch() -> String {
    "main".to_string()
}

/// A git repository, cloned over https or, with a private key, over ssh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitRepo {
    pub name: Identifier,

    pub uri: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Only trigger on changes under these paths
    #[serde(default)]
    pub paths: Vec<String>,

    /// Credential reference such as `((github.private_ssh_key))`
    #[serde(default)]
    pub private_key: Option<String>,

    #[serde(default)]
    pub check_every: Option<String>,
}

impl GitRepo {
    pub fn new(name: Identifier, uri: impl Into<String>) -> Self {
        Self {
            name,
            uri: uri.into(),
            branch: default_branch(),
            paths: Vec::new(),
            private_key: None,
            check_every: None,
        }
    }

    pub fn paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }
}

pub fn git_repo(repo: &GitRepo) -> Result<Resource> {
    let paths = if repo.paths.is_empty() {
        Value::Null
    } else {
        json!(repo.paths)
    };
    let mut resource = Resource::new(repo.name.clone(), Identifier::new("git")?)
        .with_icon("git")
        .with_source(source([
            ("uri", json!(repo.uri)),
            ("branch", json!(repo.branch)),
            ("paths", paths),
            ("private_key", json!(repo.private_key)),
        ]));
    resource.check_every = repo.check_every.clone();
    Ok(resource)
}

pub fn github_release(
    name: Identifier,
    owner: &str,
    repository: &str,
    tag_filter: Option<&str>,
) -> Result<Resource> {
    Ok(Resource::new(name, Identifier::new("github-release")?)
        .with_icon("github")
        .with_source(source([
            ("owner", json!(owner)),
            ("repository", json!(repository)),
            ("tag_filter", json!(tag_filter)),
            ("release", json!(true)),
        ])))
}

/// New releases of a HashiCorp product (consul, vault, ...)
pub fn hashicorp_release(name: Identifier, project: &str) -> Result<Resource> {
    Ok(Resource::new(name, Identifier::new(resource_types::HASHICORP_RELEASE)?)
        .with_source(source([("project", json!(project))])))
}

/// The newest available AMI whose name matches the pattern
pub fn amazon_ami(name: Identifier, name_pattern: &str, region: &str) -> Result<Resource> {
    Ok(Resource::new(name, Identifier::new(resource_types::AMAZON_AMI)?)
        .with_icon("server")
        .with_source(source([
            ("region", json!(region)),
            (
                "filters",
                json!({
                    "name": name_pattern,
                    "virtualization-type": "hvm",
                    "root-device-type": "ebs",
                }),
            ),
        ])))
}

pub fn registry_image(name: Identifier, repository: &str, tag: Option<&str>) -> Result<Resource> {
    Ok(Resource::new(name, Identifier::new("registry-image")?)
        .with_icon("docker")
        .with_source(source([
            ("repository", json!(repository)),
            ("tag", json!(tag)),
        ])))
}

/// A periodic trigger
pub fn schedule(name: Identifier, interval: &str) -> Result<Resource> {
    Ok(Resource::new(name, Identifier::new("time")?)
        .with_icon("clock")
        .with_source(source([("interval", json!(interval))])))
}

/// Put-only target running `packer validate`
pub fn packer_validate() -> Result<Resource> {
    Ok(Resource::new(
        Identifier::new("packer-validate")?,
        Identifier::new(resource_types::PACKER)?,
    )
    .with_check_every("never"))
}

/// Put-only target running `packer build`
pub fn packer_build() -> Result<Resource> {
    Ok(Resource::new(
        Identifier::new("packer-build")?,
        Identifier::new(resource_types::PACKER)?,
    )
    .with_check_every("never"))
}

/// Put-only target that deploys stacks of a Pulumi project
pub fn pulumi_provisioner(project_name: &str, project_path: &str) -> Result<Resource> {
    Ok(Resource::new(
        Identifier::new(format!("pulumi-{}", project_name))?,
        Identifier::new(resource_types::PULUMI)?,
    )
    .with_icon("pulumi")
    .with_check_every("never")
    .with_source(source([
        ("project_name", json!(project_name)),
        ("source_dir", json!(project_path)),
        (
            "env_pulumi",
            json!({"AWS_SHARED_CREDENTIALS_FILE": "aws_creds/credentials"}),
        ),
    ])))
}
