//! Scenario: fragments and documents written separately, combined into one

use crate::helpers::*;
use ol_concourse::jobs::{pulumi_jobs_chain, PulumiChain};
use ol_concourse::model::{merge_named, Group, Pipeline, PipelineFragment};
use ol_concourse::PipelineError;

fn chain(project: &str, code_path: &str) -> PipelineFragment {
    let chain = PulumiChain::new(
        project,
        format!("src/ol_infrastructure/applications/{}", project),
        code_repo("infra-code", code_path),
        stacks(&format!("applications.{}", project), &["QA", "Production"]),
    );
    pulumi_jobs_chain(&chain).unwrap()
}

#[test]
fn test_two_projects_share_code_and_type() {
    let combined = PipelineFragment::combine([
        chain("tika", "src/ol_infrastructure/"),
        chain("redash", "src/ol_infrastructure/"),
    ])
    .unwrap();

    let resources: Vec<String> = combined.resources.iter().map(|r| r.name.to_string()).collect();
    assert_eq!(resources, vec!["infra-code", "pulumi-tika", "pulumi-redash"]);
    assert_eq!(combined.resource_types.len(), 1);
    assert_eq!(combined.jobs.len(), 4);

    assert_valid(&combined.to_pipeline());
}

#[test]
fn test_same_name_different_definition_is_an_error() {
    let err = PipelineFragment::combine([
        chain("tika", "src/ol_infrastructure/applications/tika/"),
        chain("redash", "src/ol_infrastructure/applications/redash/"),
    ])
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::ConflictingDefinition { kind: "resource", ref name } if name == "infra-code"
    ));
}

const BASE: &str = r#"
resources:
  - {name: app-code, type: git, source: {uri: "https://github.com/mitodl/app"}}
jobs:
  - name: build
    plan: [{get: app-code, trigger: true}]
groups:
  - {name: app, jobs: [build]}
display:
  background_image: https://example.com/bg.png
"#;

const EXTRA: &str = r#"
resources:
  - {name: app-code, type: git, source: {uri: "https://github.com/mitodl/app"}}
  - {name: nightly, type: time, source: {interval: 24h}}
jobs:
  - name: deploy
    plan:
      - {get: app-code, trigger: true, passed: [build]}
      - {get: nightly, trigger: true}
groups:
  - {name: app, jobs: [build]}
  - {name: deploy, jobs: [deploy]}
"#;

#[test]
fn test_documents_merge_with_their_groups() {
    let mut groups: Vec<Group> = Vec::new();
    let mut fragments = Vec::new();
    for yaml in [BASE, EXTRA] {
        let mut document = Pipeline::from_yaml(yaml).unwrap();
        groups.append(&mut document.groups);
        fragments.push(PipelineFragment::from(document));
    }

    let pipeline = PipelineFragment::combine(fragments)
        .unwrap()
        .to_pipeline()
        .with_groups(merge_named(groups).unwrap());

    assert_valid(&pipeline);
    assert_job_order(&pipeline, &["build", "deploy"]);
    assert_eq!(pipeline.resources.len(), 2);
    let group_names: Vec<String> = pipeline.groups.iter().map(|g| g.name.to_string()).collect();
    assert_eq!(group_names, vec!["app", "deploy"]);
}

#[test]
fn test_conflicting_groups_are_rejected() {
    let groups = vec![
        Group { name: id("app"), jobs: vec!["build".to_string()] },
        Group { name: id("app"), jobs: vec!["deploy".to_string()] },
    ];
    let err = merge_named(groups).unwrap_err();
    assert_eq!(err.to_string(), "conflicting definitions for group 'app'");
}

#[test]
fn test_merged_document_survives_json() {
    let pipeline = PipelineFragment::from(Pipeline::from_yaml(EXTRA).unwrap()).to_pipeline();
    let json = pipeline.to_json_pretty().unwrap();

    assert!(json.contains("\"passed\": [\n"));
    assert_eq!(Pipeline::from_json(&json).unwrap(), pipeline);
}
