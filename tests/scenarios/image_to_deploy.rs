//! Scenario: an image build feeding a three-environment deployment

use crate::helpers::*;
use ol_concourse::catalog::{resource_types, resources};
use ol_concourse::jobs::{packer_jobs, pulumi_jobs_chain, PackerBuild, PulumiChain};
use ol_concourse::model::{GetStep, Pipeline, PipelineFragment, Step};

const CI: &str = "deploy-ol-infrastructure-tika-server-applications.tika.ci";
const QA: &str = "deploy-ol-infrastructure-tika-server-applications.tika.qa";
const PRODUCTION: &str = "deploy-ol-infrastructure-tika-server-applications.tika.production";

fn tika_build(node_types: &[&str]) -> PackerBuild {
    let mut build = PackerBuild::new(
        "tika",
        code_repo("tika-image-code", "src/bilder/images/tika/"),
        "src/bilder/images/tika/tika.pkr.hcl",
    );
    build.node_types = node_types.iter().map(|n| n.to_string()).collect();
    build.dependencies = vec![GetStep::new(id("consul-release"))];
    build
}

fn tika_pipeline() -> Pipeline {
    let build = tika_build(&["server"]);

    let mut chain = PulumiChain::new(
        "ol-infrastructure-tika-server",
        "src/ol_infrastructure/applications/tika",
        code_repo("tika-pulumi-code", "src/ol_infrastructure/applications/tika/"),
        stacks("applications.tika", &["CI", "QA", "Production"]),
    );
    chain.dependencies = vec![GetStep::new(id("tika-image-code"))
        .trigger(true)
        .passed(vec![build.build_job_name().unwrap()])];

    let releases = PipelineFragment::new(
        vec![resource_types::hashicorp_release().unwrap()],
        vec![resources::hashicorp_release(id("consul-release"), "consul").unwrap()],
        Vec::new(),
    );

    PipelineFragment::combine([
        releases,
        packer_jobs(&build).unwrap(),
        pulumi_jobs_chain(&chain).unwrap(),
    ])
    .unwrap()
    .to_pipeline()
}

#[test]
fn test_image_build_gates_the_first_deploy() {
    let pipeline = tika_pipeline();

    assert_valid(&pipeline);
    assert_job_order(
        &pipeline,
        &["validate-tika-packer", "build-tika-ami", CI, QA, PRODUCTION],
    );
    assert_passed(&pipeline, "build-tika-ami", "tika-image-code", &["validate-tika-packer"]);
    assert_passed(&pipeline, "build-tika-ami", "consul-release", &["validate-tika-packer"]);
    assert_passed(&pipeline, CI, "tika-image-code", &["build-tika-ami"]);
    assert_passed(&pipeline, CI, "tika-pulumi-code", &[]);
}

#[test]
fn test_later_stages_are_gated_on_the_previous_stage() {
    let pipeline = tika_pipeline();

    assert_passed(&pipeline, QA, "tika-pulumi-code", &[CI]);
    assert_passed(&pipeline, QA, "tika-image-code", &[CI]);
    assert_passed(&pipeline, PRODUCTION, "tika-pulumi-code", &[QA]);
    assert_passed(&pipeline, PRODUCTION, "tika-image-code", &[QA]);
}

#[test]
fn test_production_is_triggered_manually() {
    let pipeline = tika_pipeline();

    for job in [CI, QA] {
        let job = pipeline.job(job).unwrap();
        assert!(gets(job).iter().all(|get| get.trigger), "{} should trigger", job.name);
    }

    let production = pipeline.job(PRODUCTION).unwrap();
    assert!(gets(production).iter().all(|get| !get.trigger));

    let json = serde_json::to_value(production).unwrap();
    assert!(json["plan"][0].get("trigger").is_none());
    assert_eq!(json["plan"][0]["passed"], serde_json::json!([QA]));
}

#[test]
fn test_shared_definitions_appear_once() {
    let pipeline = tika_pipeline();

    let image_code = pipeline
        .resources
        .iter()
        .filter(|resource| resource.name == "tika-image-code")
        .count();
    assert_eq!(image_code, 1);

    let types: Vec<String> = pipeline.resource_types.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(types, vec!["hashicorp-release", "packer", "pulumi"]);
    assert!(pipeline.resource("pulumi-ol-infrastructure-tika-server").is_some());
}

#[test]
fn test_dependency_edges() {
    let edges: Vec<String> = tika_pipeline()
        .dependency_edges()
        .iter()
        .map(|edge| edge.to_string())
        .collect();

    assert!(edges.contains(&"validate-tika-packer -> build-tika-ami (tika-image-code)".to_string()));
    assert!(edges.contains(&format!("build-tika-ami -> {} (tika-image-code)", CI)));
    assert!(edges.contains(&format!("{} -> {} (tika-pulumi-code)", QA, PRODUCTION)));
    assert!(!edges.iter().any(|edge| edge.starts_with(PRODUCTION)));
}

#[test]
fn test_one_packer_put_per_node_type() {
    let fragment = packer_jobs(&tika_build(&["server", "web"])).unwrap();
    let build = &fragment.jobs[1];

    let puts = match build.plan.last() {
        Some(Step::InParallel(parallel)) => parallel.in_parallel.steps(),
        other => panic!("Expected in_parallel, got {:?}", other),
    };
    assert_eq!(puts.len(), 2);
    for (step, node_type) in puts.iter().zip(["server", "web"]) {
        match step {
            Step::Put(put) => {
                let params = put.params.as_ref().unwrap();
                assert_eq!(params["objective"], "build");
                assert_eq!(params["vars"]["node_type"], node_type);
                assert!(put.no_get);
            }
            other => panic!("Expected put, got {:?}", other),
        }
    }
}
