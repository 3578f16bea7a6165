//! Referential-integrity checks for a pipeline document
//!
//! Names must be unique, every get/put must name a declared resource, and
//! every `passed` entry must name a job defined earlier in the document
//! that itself uses the same resource.

use crate::model::{Identifier, Pipeline, Step};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Resource types every CI worker ships with
pub const CORE_RESOURCE_TYPES: &[&str] = &[
    "bosh-io-release",
    "bosh-io-stemcell",
    "docker-image",
    "git",
    "github-release",
    "hg",
    "mock",
    "pool",
    "registry-image",
    "s3",
    "semver",
    "time",
    "tracker",
];

/// A single integrity problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("resource type '{name}' is defined more than once")]
    DuplicateResourceType { name: String },

    #[error("resource '{name}' is defined more than once")]
    DuplicateResource { name: String },

    #[error("job '{name}' is defined more than once")]
    DuplicateJob { name: String },

    #[error("group '{name}' is defined more than once")]
    DuplicateGroup { name: String },

    #[error("job '{job}' gets '{name}' more than once")]
    DuplicateGetName { job: String, name: String },

    #[error("job '{job}' uses undeclared resource '{resource}'")]
    UnknownResource { job: String, resource: String },

    /// Raised for resources and for resource types built on another type
    #[error("resource '{resource}' has unknown type '{resource_type}'")]
    UnknownResourceType {
        resource: String,
        resource_type: String,
    },

    #[error("job '{job}' gets '{resource}' passed '{passed}', which is not a job")]
    UnknownPassedJob {
        job: String,
        resource: String,
        passed: String,
    },

    #[error("job '{job}' gets '{resource}' passed '{passed}', which is not defined before it")]
    PassedJobNotEarlier {
        job: String,
        resource: String,
        passed: String,
    },

    #[error("job '{job}' gets '{resource}' passed '{passed}', but '{passed}' never uses '{resource}'")]
    PassedJobMissingResource {
        job: String,
        resource: String,
        passed: String,
    },

    #[error("group '{group}' lists unknown job '{job}'")]
    UnknownGroupJob { group: String, job: String },
}

/// Every issue found in a document, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

fn duplicates<'a>(names: impl IntoIterator<Item = &'a Identifier>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            duplicates.push(name.to_string());
        }
    }
    duplicates
}

/// Check a pipeline document
pub fn validate(pipeline: &Pipeline) -> ValidationReport {
    let mut issues = Vec::new();

    issues.extend(
        duplicates(pipeline.resource_types.iter().map(|rt| &rt.name))
            .into_iter()
            .map(|name| ValidationIssue::DuplicateResourceType { name }),
    );
    issues.extend(
        duplicates(pipeline.resources.iter().map(|r| &r.name))
            .into_iter()
            .map(|name| ValidationIssue::DuplicateResource { name }),
    );
    issues.extend(
        duplicates(pipeline.jobs.iter().map(|j| &j.name))
            .into_iter()
            .map(|name| ValidationIssue::DuplicateJob { name }),
    );
    issues.extend(
        duplicates(pipeline.groups.iter().map(|g| &g.name))
            .into_iter()
            .map(|name| ValidationIssue::DuplicateGroup { name }),
    );

    let declared_types: HashSet<&str> = pipeline
        .resource_types
        .iter()
        .map(|rt| rt.name.as_str())
        .chain(CORE_RESOURCE_TYPES.iter().copied())
        .collect();
    for resource_type in &pipeline.resource_types {
        if !declared_types.contains(resource_type.resource_type.as_str()) {
            issues.push(ValidationIssue::UnknownResourceType {
                resource: resource_type.name.to_string(),
                resource_type: resource_type.resource_type.to_string(),
            });
        }
    }
    for resource in &pipeline.resources {
        if !declared_types.contains(resource.resource_type.as_str()) {
            issues.push(ValidationIssue::UnknownResourceType {
                resource: resource.name.to_string(),
                resource_type: resource.resource_type.to_string(),
            });
        }
    }

    let resources: HashSet<&Identifier> = pipeline.resources.iter().map(|r| &r.name).collect();
    let job_positions: HashMap<&Identifier, usize> = pipeline
        .jobs
        .iter()
        .enumerate()
        .rev()
        .map(|(position, job)| (&job.name, position))
        .collect();

    for (position, job) in pipeline.jobs.iter().enumerate() {
        for step in job.steps() {
            let used = match step {
                Step::Get(get) => get.resource_name(),
                Step::Put(put) => put.resource_name(),
                _ => continue,
            };
            if !resources.contains(used) {
                issues.push(ValidationIssue::UnknownResource {
                    job: job.name.to_string(),
                    resource: used.to_string(),
                });
            }

            let Step::Get(get) = step else { continue };
            for passed in &get.passed {
                let issue = match job_positions.get(passed) {
                    None => Some(ValidationIssue::UnknownPassedJob {
                        job: job.name.to_string(),
                        resource: used.to_string(),
                        passed: passed.to_string(),
                    }),
                    Some(&upstream) if upstream >= position => {
                        Some(ValidationIssue::PassedJobNotEarlier {
                            job: job.name.to_string(),
                            resource: used.to_string(),
                            passed: passed.to_string(),
                        })
                    }
                    Some(&upstream) if !pipeline.jobs[upstream].uses_resource(used) => {
                        Some(ValidationIssue::PassedJobMissingResource {
                            job: job.name.to_string(),
                            resource: used.to_string(),
                            passed: passed.to_string(),
                        })
                    }
                    Some(_) => None,
                };
                issues.extend(issue);
            }
        }

        let get_names = job.steps().into_iter().filter_map(|step| match step {
            Step::Get(get) => Some(&get.get),
            _ => None,
        });
        issues.extend(
            duplicates(get_names)
                .into_iter()
                .map(|name| ValidationIssue::DuplicateGetName {
                    job: job.name.to_string(),
                    name,
                }),
        );
    }

    let job_names: HashSet<&str> = pipeline.jobs.iter().map(|j| j.name.as_str()).collect();
    for group in &pipeline.groups {
        for job in &group.jobs {
            // Entries containing glob characters are matched by the server
            if job.contains(['*', '?', '[']) {
                continue;
            }
            if !job_names.contains(job.as_str()) {
                issues.push(ValidationIssue::UnknownGroupJob {
                    group: group.name.to_string(),
                    job: job.clone(),
                });
            }
        }
    }

    debug!("Validation found {} issue(s)", issues.len());
    ValidationReport { issues }
}
