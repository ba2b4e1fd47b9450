use uuid::Uuid;

use crate::compiler::CompileState;
use crate::compiler::graph::{ExecutionType, GraphArena, ResolvedEntity};
use crate::definition::{TaskRecord, WorkflowRecord};
use crate::engine::{EVENT_REDIRECTOR_CLASS, NOOP_TASK_CLASS, REDIRECT_EVENT_PROPERTY};
use crate::error::CompilationError;
use crate::model::Configuration;

/// Turns the nested composition trees into a flat event dispatch table:
/// sequential compositions become ordered task lists with redirector
/// hand-offs, parallel compositions become fan-out event entries.
pub(super) struct EventFlattener<'a> {
    arena: &'a GraphArena,
    state: &'a mut CompileState,
}

impl<'a> EventFlattener<'a> {
    pub(super) fn new(arena: &'a GraphArena, state: &'a mut CompileState) -> Self {
        Self { arena, state }
    }

    /// Walks every workflow registered so far, in first-registration order.
    /// The pass list is snapshotted up front so wrapper workflows
    /// synthesized mid-pass keep their task lists intact.
    pub(super) fn compute_events(&mut self) -> Result<(), CompilationError> {
        let pass: Vec<String> = self.state.workflow_order.clone();
        for workflow_id in pass {
            if !self.state.workflows.contains_key(&workflow_id) {
                continue;
            }
            // A workflow always answers the event named after itself.
            self.state
                .register_event(workflow_id.clone(), vec![workflow_id.clone()]);

            let Some(&gid) = self.state.workflow_graphs.get(&workflow_id) else {
                continue;
            };
            let children = self.arena.node(gid).children.clone();

            match self.arena.node(gid).execution_type {
                Some(ExecutionType::Sequential) => {
                    let mut task_ids = Vec::new();
                    for child in children {
                        let resolved = self.arena.node(child).resolved.clone();
                        match resolved {
                            ResolvedEntity::Workflow(sub_id) => {
                                // Sub-workflows are never inlined; a
                                // hand-off task raises their event instead.
                                task_ids.push(self.generate_redirector(&sub_id));
                            }
                            ResolvedEntity::Task(task_id) => task_ids.push(task_id),
                            _ => {}
                        }
                    }
                    if let Some(workflow) = self.state.workflows.get_mut(&workflow_id) {
                        workflow.task_ids = task_ids;
                    }
                }
                Some(ExecutionType::Parallel) => {
                    let mut fan_out = Vec::new();
                    for child in children {
                        let resolved = self.arena.node(child).resolved.clone();
                        match resolved {
                            ResolvedEntity::Workflow(sub_id) => fan_out.push(sub_id),
                            ResolvedEntity::Task(task_id) => {
                                fan_out.push(self.wrap_single_task(&task_id));
                            }
                            _ => {}
                        }
                    }
                    self.state.register_event(workflow_id.clone(), fan_out);
                    // The composite leaves the workflow registry but stays
                    // reachable through event lists.
                    if let Some(mut record) = self.state.workflows.remove(&workflow_id) {
                        record.task_ids.clear();
                        self.state.detached_workflows.push(record);
                    }
                }
                other => {
                    return Err(CompilationError::UnsupportedExecutionType {
                        node_id: workflow_id,
                        type_name: other
                            .map_or("undefined", ExecutionType::as_str)
                            .to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Prepends a no-op evaluator task carrying the workflow-level
    /// conditions to every workflow that has any, making them visible to
    /// engines that only check per-task preconditions.
    pub(super) fn attach_condition_evaluators(&mut self) {
        let pass: Vec<String> = self.state.workflow_order.clone();
        for workflow_id in pass {
            let Some(workflow) = self.state.workflows.get(&workflow_id) else {
                continue;
            };
            if workflow.condition_ids.is_empty() {
                continue;
            }
            let evaluator = TaskRecord {
                task_id: format!("{}-global-conditions-eval", workflow.id),
                task_name: format!("{}-global-conditions-eval", workflow.name),
                instance_class: NOOP_TASK_CLASS.to_string(),
                condition_ids: workflow.condition_ids.clone(),
                config: Configuration::new(),
                required_met_fields: Vec::new(),
                order: 0,
            };
            let task_id = evaluator.task_id.clone();
            self.state.register_task(evaluator);
            if let Some(workflow) = self.state.workflows.get_mut(&workflow_id) {
                workflow.task_ids.insert(0, task_id);
            }
        }
    }

    fn generate_redirector(&mut self, event: &str) -> String {
        let mut config = Configuration::new();
        config.add(REDIRECT_EVENT_PROPERTY, event);
        let record = TaskRecord {
            task_id: format!("redirector-{}", Uuid::new_v4()),
            task_name: "Redirector Task".to_string(),
            instance_class: EVENT_REDIRECTOR_CLASS.to_string(),
            condition_ids: Vec::new(),
            config,
            required_met_fields: Vec::new(),
            order: 0,
        };
        let id = record.task_id.clone();
        self.state.register_task(record);
        id
    }

    fn wrap_single_task(&mut self, task_id: &str) -> String {
        let task_name = self
            .state
            .tasks
            .get(task_id)
            .map(|task| task.task_name.clone())
            .unwrap_or_default();
        let record = WorkflowRecord {
            id: format!("parallel-{}", Uuid::new_v4()),
            name: format!("Parallel Single Task {task_name}"),
            task_ids: vec![task_id.to_string()],
            condition_ids: Vec::new(),
        };
        let id = record.id.clone();
        self.state.register_workflow(record);
        id
    }
}
