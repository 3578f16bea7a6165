//! Pipeline document model

use crate::error::{PipelineError, Result};
use crate::model::{Identifier, Job, Named, Resource, ResourceType, Step};
use crate::validate::{self, ValidationReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A named set of jobs shown together in the web UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: Identifier,

    /// Job names (the CI server also accepts globs here)
    #[serde(default)]
    pub jobs: Vec<String>,
}

impl Named for Group {
    const KIND: &'static str = "group";

    fn name(&self) -> &Identifier {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub background_image: String,
}

/// The complete pipeline document applied with `fly set-pipeline`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<ResourceType>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub jobs: Vec<Job>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
}

/// A `passed` constraint seen from the downstream job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEdge {
    pub upstream: Identifier,
    pub downstream: Identifier,
    pub resource: Identifier,
}

impl fmt::Display for JobEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.upstream, self.downstream, self.resource)
    }
}

impl Pipeline {
    /// Load a pipeline document; YAML parsing also accepts JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document as pretty JSON (`definition.json`)
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    /// Run the referential-integrity checks
    pub fn check(&self) -> ValidationReport {
        validate::validate(self)
    }

    /// Fail with every integrity issue found
    pub fn validate(&self) -> Result<()> {
        let report = self.check();
        if report.is_valid() {
            Ok(())
        } else {
            Err(PipelineError::Validation(report))
        }
    }

    /// Every `passed` constraint in document order
    pub fn dependency_edges(&self) -> Vec<JobEdge> {
        let mut edges = Vec::new();
        for job in &self.jobs {
            for step in job.steps() {
                if let Step::Get(get) = step {
                    for upstream in &get.passed {
                        edges.push(JobEdge {
                            upstream: upstream.clone(),
                            downstream: job.name.clone(),
                            resource: get.resource_name().clone(),
                        });
                    }
                }
            }
        }
        edges
    }
}

/// The command that applies a rendered definition
pub fn fly_command(target: &str, pipeline_name: &str, definition: &str, team: Option<&str>) -> String {
    let mut command = format!(
        "fly -t {} set-pipeline -p {} -c {}",
        target, pipeline_name, definition
    );
    if let Some(team) = team {
        command.push_str(&format!(" --team {}", team));
    }
    command
}
