//! Job domain model

use crate::model::{is_false, Config, Hooks, Identifier, Named, Step};
use serde::{Deserialize, Serialize};

/// How long build logs are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLogRetention {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_succeeded_builds: Option<u32>,
}

/// A job: a named build plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: Identifier,

    pub plan: Vec<Step>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_log_retention: Option<BuildLogRetention>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub serial: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serial_groups: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<u32>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_manual_trigger: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub interruptible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<Identifier>,

    #[serde(flatten)]
    pub hooks: Hooks,

    /// Keys not modelled above, such as `build_logs_to_retain`
    #[serde(flatten)]
    pub extra: Config,
}

impl Job {
    pub fn new(name: Identifier, plan: Vec<Step>) -> Self {
        Self {
            name,
            plan,
            build_log_retention: None,
            serial: false,
            serial_groups: Vec::new(),
            max_in_flight: None,
            public: false,
            disable_manual_trigger: false,
            interruptible: false,
            old_name: None,
            hooks: Hooks::default(),
            extra: Config::new(),
        }
    }

    pub fn with_build_log_retention(mut self, retention: BuildLogRetention) -> Self {
        self.build_log_retention = Some(retention);
        self
    }

    /// Every step in the plan and hooks, nested steps included
    pub fn steps(&self) -> Vec<&Step> {
        let mut steps = Vec::new();
        for step in self.plan.iter().chain(self.hooks.iter()) {
            step.walk(&mut |s| steps.push(s));
        }
        steps
    }

    /// Whether any step in this job gets or puts the named resource
    pub fn uses_resource(&self, resource: &Identifier) -> bool {
        self.steps().into_iter().any(|step| match step {
            Step::Get(get) => get.resource_name() == resource,
            Step::Put(put) => put.resource_name() == resource,
            _ => false,
        })
    }
}

impl Named for Job {
    const KIND: &'static str = "job";

    fn name(&self) -> &Identifier {
        &self.name
    }
}
