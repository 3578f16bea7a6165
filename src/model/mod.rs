//! Typed model of the pipeline document
//!
//! Types mirror the CI server's pipeline schema and serialize to the same
//! keys, so a `Pipeline` written as JSON is a valid `definition.json`.

pub mod fragment;
pub mod identifier;
pub mod job;
pub mod pipeline;
pub mod resource;
pub mod step;
pub mod task;

pub use fragment::*;
pub use identifier::*;
pub use job::*;
pub use pipeline::*;
pub use resource::*;
pub use step::*;
pub use task::*;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
