//! Scenario: hand-written documents with referential problems

use crate::helpers::*;
use ol_concourse::model::Pipeline;
use ol_concourse::validate::ValidationIssue;
use ol_concourse::PipelineError;

const BROKEN: &str = r#"
resources:
  - name: app-code
    type: git
    source: {uri: "https://github.com/mitodl/app"}
  - name: app-image
    type: docker-imag
    source: {repository: mitodl/app}
  - name: nightly
    type: time
    source: {interval: 24h}
jobs:
  - name: deploy-qa
    plan:
      - get: app-code
        trigger: true
        passed: [build-app]
  - name: build-app
    plan:
      - in_parallel:
          - get: app-code
            trigger: true
          - get: nightly
      - put: app-image
  - name: deploy-production
    plan:
      - get: app-code
        passed: [build-app, release-app]
      - get: nightly
        passed: [deploy-qa]
    ensure:
      put: slack-alert
groups:
  - name: app
    jobs: [build-app, deploy-qa, deploy-prod, "deploy-*"]
"#;

#[test]
fn test_every_issue_is_reported() {
    let pipeline = Pipeline::from_yaml(BROKEN).unwrap();
    let report = pipeline.check();

    assert_issue(
        &report,
        &ValidationIssue::PassedJobNotEarlier {
            job: "deploy-qa".to_string(),
            resource: "app-code".to_string(),
            passed: "build-app".to_string(),
        },
    );
    assert_issue(
        &report,
        &ValidationIssue::UnknownPassedJob {
            job: "deploy-production".to_string(),
            resource: "app-code".to_string(),
            passed: "release-app".to_string(),
        },
    );
    assert_issue(
        &report,
        &ValidationIssue::PassedJobMissingResource {
            job: "deploy-production".to_string(),
            resource: "nightly".to_string(),
            passed: "deploy-qa".to_string(),
        },
    );
    assert_issue(
        &report,
        &ValidationIssue::UnknownResource {
            job: "deploy-production".to_string(),
            resource: "slack-alert".to_string(),
        },
    );
    assert_issue(
        &report,
        &ValidationIssue::UnknownResourceType {
            resource: "app-image".to_string(),
            resource_type: "docker-imag".to_string(),
        },
    );
    assert_issue(
        &report,
        &ValidationIssue::UnknownGroupJob {
            group: "app".to_string(),
            job: "deploy-prod".to_string(),
        },
    );
    assert_eq!(report.issues.len(), 6, "{:#?}", report.issues);
}

#[test]
fn test_validate_wraps_the_report() {
    let pipeline = Pipeline::from_yaml(BROKEN).unwrap();
    match pipeline.validate() {
        Err(PipelineError::Validation(report)) => assert_eq!(report.issues.len(), 6),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_self_reference_is_not_earlier() {
    let yaml = r#"
resources:
  - {name: app-code, type: git, source: {uri: "https://x"}}
jobs:
  - name: loop
    plan:
      - {get: app-code, passed: [loop]}
"#;
    let report = Pipeline::from_yaml(yaml).unwrap().check();
    assert_eq!(
        report.issues,
        vec![ValidationIssue::PassedJobNotEarlier {
            job: "loop".to_string(),
            resource: "app-code".to_string(),
            passed: "loop".to_string(),
        }]
    );
}

#[test]
fn test_invalid_identifier_is_rejected_on_load() {
    let yaml = r#"
resources:
  - {name: App_Code, type: git, source: {uri: "https://x"}}
jobs: []
"#;
    assert!(Pipeline::from_yaml(yaml).is_err());
}

#[test]
fn test_passed_through_nested_steps_counts_as_use() {
    let yaml = r#"
resources:
  - {name: app-code, type: git, source: {uri: "https://x"}}
jobs:
  - name: build
    plan:
      - do:
          - try:
              get: app-code
  - name: deploy
    plan:
      - {get: app-code, passed: [build]}
"#;
    assert_valid(&Pipeline::from_yaml(yaml).unwrap());
}
