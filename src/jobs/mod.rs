//! Builders that assemble jobs into pipeline fragments

pub mod infrastructure;
pub mod meta;

pub use infrastructure::{packer_jobs, pulumi_job, pulumi_jobs_chain, PackerBuild, PulumiChain, PulumiStage};
pub use meta::{meta_pipeline_job, MetaPipeline};
