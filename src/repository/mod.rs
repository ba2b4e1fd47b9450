use std::sync::Arc;

use crate::error::RepositoryError;
use crate::model::{Configuration, Workflow, WorkflowCondition, WorkflowTask};

pub mod compiled;

pub use compiled::*;

/// The query and mutation surface of a workflow definition repository.
///
/// Queries hand out `Arc`-shared entities: two lookups that resolve to the
/// same registered definition return handles to the same allocation, so
/// shared-definition identity is observable via [`Arc::ptr_eq`]. Lookups on
/// absent keys return `None` or an empty list; the one historical exception
/// is [`conditions_by_workflow_id`](Self::conditions_by_workflow_id), which
/// treats a missing workflow as an error.
///
/// Implementations must be safe to share across engine threads: concurrent
/// reads never block each other, and the append-only mutations are
/// serialized against in-flight reads.
pub trait WorkflowRepository: Send + Sync {
    fn workflow_by_name(&self, name: &str) -> Option<Arc<Workflow>>;

    fn workflow_by_id(&self, id: &str) -> Option<Arc<Workflow>>;

    /// All registered workflows, in first-registration order.
    fn workflows(&self) -> Vec<Arc<Workflow>>;

    fn tasks_by_workflow_id(&self, id: &str) -> Vec<Arc<WorkflowTask>>;

    fn tasks_by_workflow_name(&self, name: &str) -> Vec<Arc<WorkflowTask>>;

    /// The workflows to launch, all concurrently and independently, when
    /// the named event fires.
    fn workflows_for_event(&self, event: &str) -> Vec<Arc<Workflow>>;

    fn conditions_by_task_name(&self, name: &str) -> Vec<Arc<WorkflowCondition>>;

    fn conditions_by_task_id(&self, id: &str) -> Vec<Arc<WorkflowCondition>>;

    /// The registered configuration group keyed by the task's identifier,
    /// which is where a task's unnamed configuration block lands.
    fn configuration_by_task_id(&self, id: &str) -> Option<Configuration>;

    fn workflow_task_by_id(&self, id: &str) -> Option<Arc<WorkflowTask>>;

    /// Historical duplicate of [`workflow_task_by_id`](Self::workflow_task_by_id),
    /// kept because both spellings are part of the repository contract.
    fn task_by_id(&self, id: &str) -> Option<Arc<WorkflowTask>> {
        self.workflow_task_by_id(id)
    }

    fn workflow_condition_by_id(&self, id: &str) -> Option<Arc<WorkflowCondition>>;

    /// All event names with at least one workflow mapped, sorted.
    fn registered_events(&self) -> Vec<String>;

    /// Workflow-level preconditions of the given workflow. Unlike the other
    /// reads, a missing workflow is an error here.
    fn conditions_by_workflow_id(
        &self,
        id: &str,
    ) -> Result<Vec<Arc<WorkflowCondition>>, RepositoryError>;

    /// Registers a task after checking that every precondition it lists is
    /// already present in the conditions registry. Keeps the task's
    /// identifier when set, otherwise assigns a fresh one; returns the
    /// identifier the task is registered under.
    fn add_task(&self, task: WorkflowTask) -> Result<String, RepositoryError>;

    /// Registers a workflow after checking that it has tasks, that every
    /// task is already registered, and that every task's preconditions are
    /// registered. On success the workflow also answers the event named
    /// after its identifier. Validation is all-or-nothing; a failed add
    /// leaves the registries untouched.
    fn add_workflow(&self, workflow: Workflow) -> Result<String, RepositoryError>;
}
