use ahash::AHashMap;

use crate::error::ExecutionError;
use crate::model::Configuration;

/// Implementation-class handle bound to synthesized redirector tasks. An
/// execution engine must resolve this handle to an instance that raises the
/// event named by [`REDIRECT_EVENT_PROPERTY`] in the task's configuration.
pub const EVENT_REDIRECTOR_CLASS: &str = "event-redirector";

/// Implementation-class handle bound to synthesized no-op tasks, such as the
/// workflow-level condition evaluator prepended during compilation.
pub const NOOP_TASK_CLASS: &str = "noop-task";

/// Configuration property on a redirector task holding the event to raise.
pub const REDIRECT_EVENT_PROPERTY: &str = "eventName";

/// A runnable unit of work resolved from a task's implementation-class
/// handle. The repository never instantiates these; an execution engine
/// looks them up through an [`InstanceRegistry`] at dispatch time.
pub trait TaskInstance: Send + Sync {
    fn run(&self, metadata: &mut Configuration, config: &Configuration)
    -> Result<(), ExecutionError>;
}

/// A guard evaluated before a task or workflow proceeds.
pub trait ConditionInstance: Send + Sync {
    fn evaluate(&self, metadata: &Configuration, config: &Configuration) -> bool;
}

type TaskFactory = Box<dyn Fn() -> Box<dyn TaskInstance> + Send + Sync>;
type ConditionFactory = Box<dyn Fn() -> Box<dyn ConditionInstance> + Send + Sync>;

/// Factory registry keyed by implementation-class handle. Ships with the
/// built-in no-op handle registered; engines add their own task and
/// condition implementations, including one for [`EVENT_REDIRECTOR_CLASS`].
pub struct InstanceRegistry {
    tasks: AHashMap<String, TaskFactory>,
    conditions: AHashMap<String, ConditionFactory>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            tasks: AHashMap::new(),
            conditions: AHashMap::new(),
        };
        registry.register_task(NOOP_TASK_CLASS, || Box::new(NoOpTask));
        registry
    }

    pub fn register_task(
        &mut self,
        class: impl Into<String>,
        factory: impl Fn() -> Box<dyn TaskInstance> + Send + Sync + 'static,
    ) {
        self.tasks.insert(class.into(), Box::new(factory));
    }

    pub fn register_condition(
        &mut self,
        class: impl Into<String>,
        factory: impl Fn() -> Box<dyn ConditionInstance> + Send + Sync + 'static,
    ) {
        self.conditions.insert(class.into(), Box::new(factory));
    }

    pub fn task_instance(&self, class: &str) -> Option<Box<dyn TaskInstance>> {
        self.tasks.get(class).map(|factory| factory())
    }

    pub fn condition_instance(&self, class: &str) -> Option<Box<dyn ConditionInstance>> {
        self.conditions.get(class).map(|factory| factory())
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in task that performs no work and always succeeds.
pub struct NoOpTask;

impl TaskInstance for NoOpTask {
    fn run(
        &self,
        _metadata: &mut Configuration,
        _config: &Configuration,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }
}
