//! Scenario: rendering a full configuration file

use crate::helpers::*;
use ol_concourse::config::PipelineConfig;
use ol_concourse::model::{Pipeline, Step};

const CONFIG: &str = r#"
name: tika
team: infrastructure
groups: true
resources:
  - kind: git
    name: tika-image-code
    uri: https://github.com/mitodl/ol-infrastructure
    paths: [src/bilder/images/tika/]
  - kind: git
    name: tika-pulumi-code
    uri: https://github.com/mitodl/ol-infrastructure
    paths: [src/ol_infrastructure/applications/tika/]
  - kind: git
    name: pipeline-code
    uri: https://github.com/mitodl/ol-infrastructure
    paths: [pipelines/tika.yaml]
  - kind: hashicorp_release
    name: consul-release
    project: consul
  - kind: hashicorp_release
    name: vault-release
    project: vault
images:
  - name: tika
    code: tika-image-code
    template_path: src/bilder/images/tika/tika.pkr.hcl
    node_types: [server]
    vars:
      app_version: "2.5.0"
    dependencies: [consul-release, vault-release]
deployments:
  - project_name: ol-infrastructure-tika-server
    code: tika-pulumi-code
    source_path: src/ol_infrastructure/applications/tika
    stack_prefix: applications.tika
    environments: [CI, QA, Production]
    image: tika
    env_vars:
      GITHUB_TOKEN: ((github.token))
meta:
  code: pipeline-code
  config_path: pipelines/tika.yaml
"#;

#[test]
fn test_render_full_configuration() {
    let config = PipelineConfig::from_yaml(CONFIG).unwrap();
    let pipeline = config.to_pipeline().unwrap();

    assert_valid(&pipeline);
    assert_job_order(
        &pipeline,
        &[
            "set-tika-pipeline",
            "validate-tika-packer",
            "build-tika-ami",
            "deploy-ol-infrastructure-tika-server-applications.tika.ci",
            "deploy-ol-infrastructure-tika-server-applications.tika.qa",
            "deploy-ol-infrastructure-tika-server-applications.tika.production",
        ],
    );

    // Two releases share one custom type
    let types: Vec<String> = pipeline.resource_types.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(types, vec!["hashicorp-release", "packer", "pulumi"]);

    let groups: Vec<String> = pipeline.groups.iter().map(|g| g.name.to_string()).collect();
    assert_eq!(groups, vec!["meta", "tika-image", "ol-infrastructure-tika-server"]);
}

#[test]
fn test_meta_job_sets_itself() {
    let pipeline = PipelineConfig::from_yaml(CONFIG).unwrap().to_pipeline().unwrap();
    let meta = pipeline.job("set-tika-pipeline").unwrap();

    assert!(find_get(meta, "pipeline-code").trigger);
    match meta.plan.last() {
        Some(Step::SetPipeline(set)) => assert_eq!(set.set_pipeline, "self"),
        other => panic!("Expected set_pipeline, got {:?}", other),
    }
}

#[test]
fn test_env_vars_reach_the_deploy_put() {
    let pipeline = PipelineConfig::from_yaml(CONFIG).unwrap().to_pipeline().unwrap();
    let ci = pipeline
        .job("deploy-ol-infrastructure-tika-server-applications.tika.ci")
        .unwrap();

    let put = ci
        .plan
        .iter()
        .find_map(|step| match step {
            Step::Put(put) => Some(put),
            _ => None,
        })
        .unwrap();
    let env_os = &put.params.as_ref().unwrap()["env_os"];
    assert_eq!(env_os["GITHUB_TOKEN"], "((github.token))");
    assert_eq!(env_os["AWS_DEFAULT_REGION"], "us-east-1");
}

#[test]
fn test_rendered_file_loads_back() {
    let config = PipelineConfig::from_yaml(CONFIG).unwrap();
    let pipeline = config.to_pipeline().unwrap();

    let path = std::env::temp_dir().join(format!("ol-concourse-render-{}.json", std::process::id()));
    pipeline.write_json(&path).unwrap();
    let loaded = Pipeline::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, pipeline);
    assert_eq!(
        config.fly_command("definition.json"),
        "fly -t pr-inf set-pipeline -p tika -c definition.json --team infrastructure"
    );
}
