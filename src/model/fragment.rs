//! Pipeline fragments
//!
//! A fragment is the slice of a pipeline produced by one builder: the
//! resource types, resources and jobs it needs. Fragments written
//! independently are combined into a single document; items that appear in
//! several fragments are deduplicated by name.

use crate::error::{PipelineError, Result};
use crate::model::{Job, Named, Pipeline, Resource, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineFragment {
    #[serde(default)]
    pub resource_types: Vec<ResourceType>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl PipelineFragment {
    pub fn new(resource_types: Vec<ResourceType>, resources: Vec<Resource>, jobs: Vec<Job>) -> Self {
        Self {
            resource_types,
            resources,
            jobs,
        }
    }

    /// Concatenate fragments in order, dropping repeated definitions
    ///
    /// Fails when two fragments define the same name differently.
    pub fn combine<I>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = PipelineFragment>,
    {
        let mut resource_types = Vec::new();
        let mut resources = Vec::new();
        let mut jobs = Vec::new();
        let mut count = 0;

        for fragment in fragments {
            resource_types.extend(fragment.resource_types);
            resources.extend(fragment.resources);
            jobs.extend(fragment.jobs);
            count += 1;
        }

        let combined = Self {
            resource_types: merge_named(resource_types)?,
            resources: merge_named(resources)?,
            jobs: merge_named(jobs)?,
        };

        info!(
            "Combined {} fragments into {} resource types, {} resources, {} jobs",
            count,
            combined.resource_types.len(),
            combined.resources.len(),
            combined.jobs.len()
        );

        Ok(combined)
    }

    pub fn merge(self, other: PipelineFragment) -> Result<Self> {
        Self::combine([self, other])
    }

    pub fn to_pipeline(self) -> Pipeline {
        Pipeline {
            resource_types: self.resource_types,
            resources: self.resources,
            jobs: self.jobs,
            groups: Vec::new(),
            display: None,
        }
    }
}

impl From<Pipeline> for PipelineFragment {
    fn from(pipeline: Pipeline) -> Self {
        Self {
            resource_types: pipeline.resource_types,
            resources: pipeline.resources,
            jobs: pipeline.jobs,
        }
    }
}

/// Merge a list keyed by name, keeping first occurrences in order
///
/// A later item identical to an earlier one with the same name is dropped.
/// A later item with the same name and a different definition is an error.
pub fn merge_named<T>(items: impl IntoIterator<Item = T>) -> Result<Vec<T>>
where
    T: Named + PartialEq,
{
    let mut merged: Vec<T> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in items {
        let name = item.name().as_str();
        match positions.get(name) {
            Some(&position) if merged[position] == item => {
                debug!("Dropping duplicate {} '{}'", T::KIND, name);
            }
            Some(_) => {
                return Err(PipelineError::ConflictingDefinition {
                    kind: T::KIND,
                    name: name.to_string(),
                });
            }
            None => {
                positions.insert(name.to_string(), merged.len());
                merged.push(item);
            }
        }
    }

    Ok(merged)
}
