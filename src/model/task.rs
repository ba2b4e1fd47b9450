use std::sync::Arc;

use super::{Configuration, WorkflowCondition};

/// A unit of work with its own preconditions and configuration. The
/// implementation behind `instance_class` is run by the external execution
/// engine; the repository only stores and serves the definition.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTask {
    pub task_id: String,
    pub task_name: String,
    /// Opaque implementation handle, resolved by the execution engine.
    pub instance_class: String,
    /// Ordered preconditions; the engine checks them before running the task.
    pub conditions: Vec<Arc<WorkflowCondition>>,
    pub config: Configuration,
    /// Metadata keys that must be present before the task can run.
    pub required_met_fields: Vec<String>,
    pub order: i32,
}

impl WorkflowTask {
    /// Creates a task with defaults. An empty display name falls back to
    /// the identifier.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let task_id = id.into();
        let mut task_name = name.into();
        if task_name.is_empty() {
            task_name = task_id.clone();
        }
        Self {
            task_id,
            task_name,
            instance_class: String::new(),
            conditions: Vec::new(),
            config: Configuration::new(),
            required_met_fields: Vec::new(),
            order: 0,
        }
    }
}
