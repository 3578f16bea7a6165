//! Build plan steps
//!
//! A step is identified by the key that names its action (`get`, `put`,
//! `task`, `set_pipeline`, `load_var`, `in_parallel`, `do`, `try`), so the enum is
//! untagged and every variant carries the same modifiers and hooks.

use crate::model::{is_false, Config, Identifier, TaskConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Hooks shared by steps and jobs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hooks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Box<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Box<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<Box<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_abort: Option<Box<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure: Option<Box<Step>>,
}

impl Hooks {
    /// Iterate over the hooks that are set
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        [
            &self.on_success,
            &self.on_failure,
            &self.on_error,
            &self.on_abort,
            &self.ensure,
        ]
        .into_iter()
        .filter_map(|hook| hook.as_deref())
    }
}

/// Modifiers accepted by every step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepModifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(flatten)]
    pub hooks: Hooks,

    /// Keys no step models, such as `skip_download` on a get
    #[serde(flatten)]
    pub extra: Config,
}

/// Fetch a version of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetStep {
    /// Name of the artifact in the build (and of the resource unless `resource` is set)
    pub get: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Identifier>,

    /// Jobs a version must have passed through before it is fetched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passed: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Config>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub trigger: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

impl GetStep {
    pub fn new(get: Identifier) -> Self {
        Self {
            get,
            resource: None,
            passed: Vec::new(),
            params: None,
            trigger: false,
            version: None,
            modifiers: StepModifiers::default(),
        }
    }

    pub fn trigger(mut self, trigger: bool) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn passed(mut self, jobs: Vec<Identifier>) -> Self {
        self.passed = jobs;
        self
    }

    pub fn params(mut self, params: Config) -> Self {
        self.params = Some(params);
        self
    }

    /// The pipeline resource this step fetches
    pub fn resource_name(&self) -> &Identifier {
        self.resource.as_ref().unwrap_or(&self.get)
    }
}

/// Push a new version of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutStep {
    pub put: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_params: Option<Config>,

    /// Skip the implicit get after the put
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_get: bool,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

impl PutStep {
    pub fn new(put: Identifier) -> Self {
        Self {
            put,
            resource: None,
            inputs: None,
            params: None,
            get_params: None,
            no_get: false,
            modifiers: StepModifiers::default(),
        }
    }

    pub fn params(mut self, params: Config) -> Self {
        self.params = Some(params);
        self
    }

    pub fn no_get(mut self, no_get: bool) -> Self {
        self.no_get = no_get;
        self
    }

    pub fn resource_name(&self) -> &Identifier {
        self.resource.as_ref().unwrap_or(&self.put)
    }
}

/// Run a task, either inline or loaded from a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStep {
    pub task: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TaskConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Identifier>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub privileged: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mapping: Option<BTreeMap<String, Identifier>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_mapping: Option<BTreeMap<String, Identifier>>,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

impl TaskStep {
    pub fn inline(task: Identifier, config: TaskConfig) -> Self {
        Self {
            task,
            config: Some(config),
            file: None,
            image: None,
            privileged: false,
            vars: None,
            params: None,
            input_mapping: None,
            output_mapping: None,
            modifiers: StepModifiers::default(),
        }
    }
}

/// Configure a pipeline from a file produced earlier in the build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPipelineStep {
    /// Pipeline name, or `self` to update the running pipeline
    pub set_pipeline: String,

    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Config>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub var_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_vars: Option<Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

/// Load a value from a file into a build-local var
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadVarStep {
    pub load_var: Identifier,

    pub file: String,

    /// `json`, `yaml`, `yml`, `trim` or `raw`; guessed from the file extension when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub reveal: bool,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

impl LoadVarStep {
    pub fn new(load_var: Identifier, file: impl Into<String>) -> Self {
        Self {
            load_var,
            file: file.into(),
            format: None,
            reveal: false,
            modifiers: StepModifiers::default(),
        }
    }
}

/// `in_parallel` accepts a bare list of steps or a map with options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParallelSteps {
    List(Vec<Step>),
    Config {
        steps: Vec<Step>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,

        #[serde(default, skip_serializing_if = "is_false")]
        fail_fast: bool,
    },
}

impl ParallelSteps {
    pub fn steps(&self) -> &[Step] {
        match self {
            ParallelSteps::List(steps) => steps,
            ParallelSteps::Config { steps, .. } => steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InParallelStep {
    pub in_parallel: ParallelSteps,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

impl InParallelStep {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            in_parallel: ParallelSteps::Config {
                steps,
                limit: None,
                fail_fast: false,
            },
            modifiers: StepModifiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoStep {
    #[serde(rename = "do")]
    pub steps: Vec<Step>,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryStep {
    #[serde(rename = "try")]
    pub step: Box<Step>,

    #[serde(flatten)]
    pub modifiers: StepModifiers,
}

/// A single entry in a job's build plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Get(GetStep),
    Put(PutStep),
    Task(TaskStep),
    SetPipeline(SetPipelineStep),
    LoadVar(LoadVarStep),
    InParallel(InParallelStep),
    Do(DoStep),
    Try(TryStep),
}

impl Step {
    pub fn modifiers(&self) -> &StepModifiers {
        match self {
            Step::Get(step) => &step.modifiers,
            Step::Put(step) => &step.modifiers,
            Step::Task(step) => &step.modifiers,
            Step::SetPipeline(step) => &step.modifiers,
            Step::LoadVar(step) => &step.modifiers,
            Step::InParallel(step) => &step.modifiers,
            Step::Do(step) => &step.modifiers,
            Step::Try(step) => &step.modifiers,
        }
    }

    /// Steps nested directly inside this one, hooks included
    pub fn children(&self) -> Vec<&Step> {
        let mut children: Vec<&Step> = match self {
            Step::InParallel(step) => step.in_parallel.steps().iter().collect(),
            Step::Do(step) => step.steps.iter().collect(),
            Step::Try(step) => vec![step.step.as_ref()],
            _ => Vec::new(),
        };
        children.extend(self.modifiers().hooks.iter());
        children
    }

    /// Visit this step and every step nested under it, depth first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Step)) {
        visit(self);
        for child in self.children() {
            child.walk(&mut *visit);
        }
    }
}

impl From<GetStep> for Step {
    fn from(step: GetStep) -> Self {
        Step::Get(step)
    }
}

impl From<PutStep> for Step {
    fn from(step: PutStep) -> Self {
        Step::Put(step)
    }
}

impl From<TaskStep> for Step {
    fn from(step: TaskStep) -> Self {
        Step::Task(step)
    }
}

impl From<SetPipelineStep> for Step {
    fn from(step: SetPipelineStep) -> Self {
        Step::SetPipeline(step)
    }
}

impl From<LoadVarStep> for Step {
    fn from(step: LoadVarStep) -> Self {
        Step::LoadVar(step)
    }
}

impl From<InParallelStep> for Step {
    fn from(step: InParallelStep) -> Self {
        Step::InParallel(step)
    }
}
