//! Test utility functions for pipeline scenarios

use ol_concourse::catalog::{resources::git_repo, GitRepo};
use ol_concourse::model::{GetStep, Identifier, Job, Pipeline, Resource, Step};
use ol_concourse::validate::{ValidationIssue, ValidationReport};

pub fn id(name: &str) -> Identifier {
    Identifier::new(name).unwrap()
}

/// A git resource pointing at the infrastructure repository
pub fn code_repo(name: &str, path: &str) -> Resource {
    git_repo(
        &GitRepo::new(id(name), "https://github.com/mitodl/ol-infrastructure")
            .paths(vec![path.to_string()]),
    )
    .unwrap()
}

pub fn stacks(prefix: &str, environments: &[&str]) -> Vec<String> {
    environments
        .iter()
        .map(|env| format!("{}.{}", prefix, env))
        .collect()
}

/// Top-level gets of a job, in plan order
pub fn gets(job: &Job) -> Vec<&GetStep> {
    job.plan
        .iter()
        .filter_map(|step| match step {
            Step::Get(get) => Some(get),
            _ => None,
        })
        .collect()
}

pub fn find_get<'a>(job: &'a Job, resource: &str) -> &'a GetStep {
    gets(job)
        .into_iter()
        .find(|get| get.get == resource)
        .unwrap_or_else(|| panic!("Job {} does not get {}", job.name, resource))
}

/// Assert the pipeline passes every integrity check
pub fn assert_valid(pipeline: &Pipeline) {
    let report = pipeline.check();
    assert!(
        report.is_valid(),
        "Expected a valid pipeline, found: {:#?}",
        report.issues
    );
}

/// Assert jobs appear in exactly this order
pub fn assert_job_order(pipeline: &Pipeline, expected: &[&str]) {
    let names: Vec<String> = pipeline.jobs.iter().map(|job| job.name.to_string()).collect();
    assert_eq!(names, expected, "Job order mismatch");
}

/// Assert that `job` gets `resource` only after it passed `upstream`
pub fn assert_passed(pipeline: &Pipeline, job: &str, resource: &str, upstream: &[&str]) {
    let job = pipeline
        .job(job)
        .unwrap_or_else(|| panic!("Job {} not found", job));
    let passed: Vec<String> = find_get(job, resource)
        .passed
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(passed, upstream, "Unexpected passed for {} in {}", resource, job.name);
}

pub fn assert_issue(report: &ValidationReport, expected: &ValidationIssue) {
    assert!(
        report.issues.contains(expected),
        "Expected issue {:?}, found: {:#?}",
        expected,
        report.issues
    );
}
