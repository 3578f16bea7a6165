//! Custom resource types used by the builders

use crate::error::Result;
use crate::model::{Config, Identifier, ResourceType};
use serde_json::json;

pub const PACKER: &str = "packer";
pub const PULUMI: &str = "pulumi";
pub const HASHICORP_RELEASE: &str = "hashicorp-release";
pub const AMAZON_AMI: &str = "amazon-ami";

fn registry_image_type(name: &str, repository: &str, tag: &str) -> Result<ResourceType> {
    let mut source = Config::new();
    source.insert("repository".to_string(), json!(repository));
    source.insert("tag".to_string(), json!(tag));
    Ok(ResourceType::new(
        Identifier::new(name)?,
        Identifier::new("registry-image")?,
        source,
    ))
}

/// Runs `packer validate` / `packer build` on put
pub fn packer() -> Result<ResourceType> {
    registry_image_type(PACKER, "mitodl/concourse-packer-resource", "latest")
}

/// Runs `pulumi up` for a stack on put
pub fn pulumi_provisioner() -> Result<ResourceType> {
    registry_image_type(PULUMI, "mitodl/concourse-pulumi-resource", "latest")
}

pub fn hashicorp_release() -> Result<ResourceType> {
    registry_image_type(
        HASHICORP_RELEASE,
        "starkandwayne/hashicorp-release-resource",
        "latest",
    )
}

pub fn amazon_ami() -> Result<ResourceType> {
    registry_image_type(AMAZON_AMI, "jdub/ami-resource", "latest")
}
