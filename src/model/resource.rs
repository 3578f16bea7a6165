//! Resources and resource types

use crate::model::{is_false, Identifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form configuration block (`source`, `params`, `vars`, ...)
pub type Config = Map<String, Value>;

/// Anything that is deduplicated by name when fragments are combined
pub trait Named {
    /// Human-readable kind used in error messages
    const KIND: &'static str;

    fn name(&self) -> &Identifier;
}

/// A resource declared at the pipeline level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: Identifier,

    #[serde(rename = "type")]
    pub resource_type: Identifier,

    #[serde(default)]
    pub source: Config,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_every: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,

    /// Keys not modelled above, written back unchanged
    #[serde(flatten)]
    pub extra: Config,
}

impl Resource {
    /// Create a resource with an empty source
    pub fn new(name: Identifier, resource_type: Identifier) -> Self {
        Self {
            name,
            resource_type,
            source: Config::new(),
            check_every: None,
            icon: None,
            public: false,
            tags: Vec::new(),
            webhook_token: None,
            version: None,
            extra: Config::new(),
        }
    }

    pub fn with_source(mut self, source: Config) -> Self {
        self.source = source;
        self
    }

    pub fn with_check_every(mut self, interval: impl Into<String>) -> Self {
        self.check_every = Some(interval.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl Named for Resource {
    const KIND: &'static str = "resource";

    fn name(&self) -> &Identifier {
        &self.name
    }
}

/// A custom resource type, usually backed by a container image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    pub name: Identifier,

    #[serde(rename = "type")]
    pub resource_type: Identifier,

    #[serde(default)]
    pub source: Config,

    #[serde(default, skip_serializing_if = "is_false")]
    pub privileged: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_every: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Config>,

    #[serde(flatten)]
    pub extra: Config,
}

impl ResourceType {
    pub fn new(name: Identifier, resource_type: Identifier, source: Config) -> Self {
        Self {
            name,
            resource_type,
            source,
            privileged: false,
            params: None,
            check_every: None,
            tags: Vec::new(),
            defaults: None,
            extra: Config::new(),
        }
    }
}

impl Named for ResourceType {
    const KIND: &'static str = "resource type";

    fn name(&self) -> &Identifier {
        &self.name
    }
}

/// An inline resource, used for a task's `image_resource`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousResource {
    #[serde(rename = "type")]
    pub resource_type: Identifier,

    #[serde(default)]
    pub source: Config,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Config>,
}
