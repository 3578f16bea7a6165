//! Resource types and resources shared by the pipeline builders

pub mod resource_types;
pub mod resources;

pub use resources::GitRepo;
