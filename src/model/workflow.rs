use std::sync::Arc;

use super::{WorkflowCondition, WorkflowTask};

/// A named, ordered list of tasks plus workflow-level preconditions,
/// runnable in response to an event.
///
/// After compilation the task list is the flattened execution plan: nested
/// sequential compositions appear as redirector tasks that hand off to the
/// sub-workflow's own event, never as inlined task runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub tasks: Vec<Arc<WorkflowTask>>,
    /// Preconditions evaluated once for the whole workflow, not per task.
    pub conditions: Vec<Arc<WorkflowCondition>>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tasks: Vec::new(),
            conditions: Vec::new(),
        }
    }
}
