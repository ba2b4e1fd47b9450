use std::sync::Arc;

use ahash::AHashMap;
use itertools::Itertools;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::compiler::Compiler;
use crate::definition::{
    ConfigurationGroupRecord, EventRecord, RepositorySnapshot, TaskRecord, WorkflowRecord,
    WorkflowSetDefinition,
};
use crate::error::{CompilationError, RepositoryError};
use crate::model::{Configuration, Workflow, WorkflowCondition, WorkflowTask};
use crate::repository::WorkflowRepository;

/// Registry maps materialized from a snapshot. Every entity is held behind
/// one `Arc` per identifier; id lists resolve to clones of those `Arc`s, so
/// all references to one definition share one allocation.
struct Registries {
    workflows: AHashMap<String, Arc<Workflow>>,
    workflow_order: Vec<String>,
    /// Parallel composites removed from the workflow registry during
    /// flattening. Not visible to id queries, but event lists still resolve
    /// against them.
    detached_workflows: AHashMap<String, Arc<Workflow>>,
    detached_order: Vec<String>,
    tasks: AHashMap<String, Arc<WorkflowTask>>,
    task_order: Vec<String>,
    conditions: AHashMap<String, Arc<WorkflowCondition>>,
    condition_order: Vec<String>,
    events: AHashMap<String, Vec<Arc<Workflow>>>,
    event_order: Vec<String>,
    configuration_groups: AHashMap<String, Configuration>,
    conf_group_order: Vec<String>,
}

impl Registries {
    fn materialize(snapshot: RepositorySnapshot) -> Result<Self, CompilationError> {
        let mut conditions = AHashMap::new();
        let mut condition_order = Vec::with_capacity(snapshot.conditions.len());
        for condition in snapshot.conditions {
            let id = condition.condition_id.clone();
            if !conditions.contains_key(&id) {
                condition_order.push(id.clone());
            }
            conditions.insert(id, Arc::new(condition));
        }

        let mut tasks = AHashMap::new();
        let mut task_order = Vec::with_capacity(snapshot.tasks.len());
        for record in snapshot.tasks {
            let task = Arc::new(resolve_task(record, &conditions)?);
            let id = task.task_id.clone();
            if !tasks.contains_key(&id) {
                task_order.push(id.clone());
            }
            tasks.insert(id, task);
        }

        let mut workflows = AHashMap::new();
        let mut workflow_order = Vec::with_capacity(snapshot.workflows.len());
        for record in snapshot.workflows {
            let workflow = Arc::new(resolve_workflow(record, &tasks, &conditions)?);
            let id = workflow.id.clone();
            if !workflows.contains_key(&id) {
                workflow_order.push(id.clone());
            }
            workflows.insert(id, workflow);
        }

        let mut detached_workflows = AHashMap::new();
        let mut detached_order = Vec::with_capacity(snapshot.detached_workflows.len());
        for record in snapshot.detached_workflows {
            let workflow = Arc::new(resolve_workflow(record, &tasks, &conditions)?);
            let id = workflow.id.clone();
            if !detached_workflows.contains_key(&id) {
                detached_order.push(id.clone());
            }
            detached_workflows.insert(id, workflow);
        }

        let mut events = AHashMap::new();
        let mut event_order = Vec::with_capacity(snapshot.events.len());
        for record in snapshot.events {
            let mut resolved = Vec::with_capacity(record.workflow_ids.len());
            for workflow_id in &record.workflow_ids {
                let workflow = workflows
                    .get(workflow_id)
                    .or_else(|| detached_workflows.get(workflow_id))
                    .cloned()
                    .ok_or_else(|| CompilationError::UnresolvedReference {
                        node_id: record.event.clone(),
                        kind: "workflow".to_string(),
                        id_ref: workflow_id.clone(),
                    })?;
                resolved.push(workflow);
            }
            if !events.contains_key(&record.event) {
                event_order.push(record.event.clone());
            }
            events.insert(record.event, resolved);
        }

        let mut configuration_groups = AHashMap::new();
        let mut conf_group_order = Vec::with_capacity(snapshot.configuration_groups.len());
        for record in snapshot.configuration_groups {
            if !configuration_groups.contains_key(&record.name) {
                conf_group_order.push(record.name.clone());
            }
            configuration_groups.insert(record.name, record.configuration);
        }

        Ok(Self {
            workflows,
            workflow_order,
            detached_workflows,
            detached_order,
            tasks,
            task_order,
            conditions,
            condition_order,
            events,
            event_order,
            configuration_groups,
            conf_group_order,
        })
    }

    fn to_snapshot(&self) -> RepositorySnapshot {
        let conditions = self
            .condition_order
            .iter()
            .filter_map(|id| self.conditions.get(id))
            .map(|condition| (**condition).clone())
            .collect();
        let tasks = self
            .task_order
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|task| task_record(task))
            .collect();
        let workflows = self
            .workflow_order
            .iter()
            .filter_map(|id| self.workflows.get(id))
            .map(|workflow| workflow_record(workflow))
            .collect();
        let detached_workflows = self
            .detached_order
            .iter()
            .filter_map(|id| self.detached_workflows.get(id))
            .map(|workflow| workflow_record(workflow))
            .collect();
        let events = self
            .event_order
            .iter()
            .filter_map(|event| {
                self.events.get(event).map(|workflows| EventRecord {
                    event: event.clone(),
                    workflow_ids: workflows.iter().map(|w| w.id.clone()).collect(),
                })
            })
            .collect();
        let configuration_groups = self
            .conf_group_order
            .iter()
            .filter_map(|name| {
                self.configuration_groups
                    .get(name)
                    .map(|configuration| ConfigurationGroupRecord {
                        name: name.clone(),
                        configuration: configuration.clone(),
                    })
            })
            .collect();

        RepositorySnapshot {
            conditions,
            tasks,
            workflows,
            detached_workflows,
            events,
            configuration_groups,
        }
    }
}

fn resolve_task(
    record: TaskRecord,
    conditions: &AHashMap<String, Arc<WorkflowCondition>>,
) -> Result<WorkflowTask, CompilationError> {
    let mut resolved = Vec::with_capacity(record.condition_ids.len());
    for condition_id in &record.condition_ids {
        let condition = conditions.get(condition_id).cloned().ok_or_else(|| {
            CompilationError::UnresolvedReference {
                node_id: record.task_id.clone(),
                kind: "condition".to_string(),
                id_ref: condition_id.clone(),
            }
        })?;
        resolved.push(condition);
    }
    Ok(WorkflowTask {
        task_id: record.task_id,
        task_name: record.task_name,
        instance_class: record.instance_class,
        conditions: resolved,
        config: record.config,
        required_met_fields: record.required_met_fields,
        order: record.order,
    })
}

fn resolve_workflow(
    record: WorkflowRecord,
    tasks: &AHashMap<String, Arc<WorkflowTask>>,
    conditions: &AHashMap<String, Arc<WorkflowCondition>>,
) -> Result<Workflow, CompilationError> {
    let mut resolved_tasks = Vec::with_capacity(record.task_ids.len());
    for task_id in &record.task_ids {
        let task =
            tasks
                .get(task_id)
                .cloned()
                .ok_or_else(|| CompilationError::UnresolvedReference {
                    node_id: record.id.clone(),
                    kind: "task".to_string(),
                    id_ref: task_id.clone(),
                })?;
        resolved_tasks.push(task);
    }
    let mut resolved_conditions = Vec::with_capacity(record.condition_ids.len());
    for condition_id in &record.condition_ids {
        let condition = conditions.get(condition_id).cloned().ok_or_else(|| {
            CompilationError::UnresolvedReference {
                node_id: record.id.clone(),
                kind: "condition".to_string(),
                id_ref: condition_id.clone(),
            }
        })?;
        resolved_conditions.push(condition);
    }
    Ok(Workflow {
        id: record.id,
        name: record.name,
        tasks: resolved_tasks,
        conditions: resolved_conditions,
    })
}

fn task_record(task: &WorkflowTask) -> TaskRecord {
    TaskRecord {
        task_id: task.task_id.clone(),
        task_name: task.task_name.clone(),
        instance_class: task.instance_class.clone(),
        condition_ids: task
            .conditions
            .iter()
            .map(|condition| condition.condition_id.clone())
            .collect(),
        config: task.config.clone(),
        required_met_fields: task.required_met_fields.clone(),
        order: task.order,
    }
}

fn workflow_record(workflow: &Workflow) -> WorkflowRecord {
    WorkflowRecord {
        id: workflow.id.clone(),
        name: workflow.name.clone(),
        task_ids: workflow.tasks.iter().map(|task| task.task_id.clone()).collect(),
        condition_ids: workflow
            .conditions
            .iter()
            .map(|condition| condition.condition_id.clone())
            .collect(),
    }
}

/// A [`WorkflowRepository`] backed by compiled definition documents.
///
/// Construction is fail-fast: every document is compiled before the
/// repository is usable, and a compilation error means no repository at
/// all. Afterwards the registries sit behind one read-write lock, so any
/// number of engine threads can query concurrently while the rare
/// `add_task`/`add_workflow` mutations serialize against them.
pub struct CompiledWorkflowRepository {
    registries: RwLock<Registries>,
}

impl CompiledWorkflowRepository {
    /// Materializes the registries from a compiled snapshot.
    pub fn new(snapshot: RepositorySnapshot) -> Result<Self, CompilationError> {
        Ok(Self {
            registries: RwLock::new(Registries::materialize(snapshot)?),
        })
    }

    /// Compiles the given definition documents and materializes the result.
    pub fn from_definitions(
        definitions: Vec<WorkflowSetDefinition>,
    ) -> Result<Self, CompilationError> {
        let snapshot = Compiler::builder(definitions).build().compile()?;
        Self::new(snapshot)
    }

    /// Loads and compiles one definition document per path.
    pub fn from_files(paths: &[impl AsRef<str>]) -> Result<Self, CompilationError> {
        let mut definitions = Vec::with_capacity(paths.len());
        for path in paths {
            definitions.push(WorkflowSetDefinition::from_file(path.as_ref())?);
        }
        Self::from_definitions(definitions)
    }

    /// Serializes the current registry contents, including any entities
    /// added after construction.
    pub fn snapshot(&self) -> RepositorySnapshot {
        self.registries.read().to_snapshot()
    }
}

impl WorkflowRepository for CompiledWorkflowRepository {
    fn workflow_by_name(&self, name: &str) -> Option<Arc<Workflow>> {
        let registries = self.registries.read();
        registries
            .workflow_order
            .iter()
            .filter_map(|id| registries.workflows.get(id))
            .find(|workflow| workflow.name == name)
            .cloned()
    }

    fn workflow_by_id(&self, id: &str) -> Option<Arc<Workflow>> {
        self.registries.read().workflows.get(id).cloned()
    }

    fn workflows(&self) -> Vec<Arc<Workflow>> {
        let registries = self.registries.read();
        registries
            .workflow_order
            .iter()
            .filter_map(|id| registries.workflows.get(id))
            .cloned()
            .collect()
    }

    fn tasks_by_workflow_id(&self, id: &str) -> Vec<Arc<WorkflowTask>> {
        self.registries
            .read()
            .workflows
            .get(id)
            .map(|workflow| workflow.tasks.clone())
            .unwrap_or_default()
    }

    fn tasks_by_workflow_name(&self, name: &str) -> Vec<Arc<WorkflowTask>> {
        self.workflow_by_name(name)
            .map(|workflow| workflow.tasks.clone())
            .unwrap_or_default()
    }

    fn workflows_for_event(&self, event: &str) -> Vec<Arc<Workflow>> {
        self.registries
            .read()
            .events
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    fn conditions_by_task_name(&self, name: &str) -> Vec<Arc<WorkflowCondition>> {
        let registries = self.registries.read();
        registries
            .task_order
            .iter()
            .filter_map(|id| registries.tasks.get(id))
            .find(|task| task.task_name == name)
            .map(|task| task.conditions.clone())
            .unwrap_or_default()
    }

    fn conditions_by_task_id(&self, id: &str) -> Vec<Arc<WorkflowCondition>> {
        self.registries
            .read()
            .tasks
            .get(id)
            .map(|task| task.conditions.clone())
            .unwrap_or_default()
    }

    fn configuration_by_task_id(&self, id: &str) -> Option<Configuration> {
        self.registries.read().configuration_groups.get(id).cloned()
    }

    fn workflow_task_by_id(&self, id: &str) -> Option<Arc<WorkflowTask>> {
        self.registries.read().tasks.get(id).cloned()
    }

    fn workflow_condition_by_id(&self, id: &str) -> Option<Arc<WorkflowCondition>> {
        self.registries.read().conditions.get(id).cloned()
    }

    fn registered_events(&self) -> Vec<String> {
        self.registries
            .read()
            .event_order
            .iter()
            .cloned()
            .sorted()
            .collect()
    }

    fn conditions_by_workflow_id(
        &self,
        id: &str,
    ) -> Result<Vec<Arc<WorkflowCondition>>, RepositoryError> {
        self.registries
            .read()
            .workflows
            .get(id)
            .map(|workflow| workflow.conditions.clone())
            .ok_or_else(|| RepositoryError::WorkflowNotFound {
                workflow_id: id.to_string(),
            })
    }

    fn add_task(&self, task: WorkflowTask) -> Result<String, RepositoryError> {
        let mut registries = self.registries.write();
        for condition in &task.conditions {
            if !registries.conditions.contains_key(&condition.condition_id) {
                return Err(RepositoryError::UndefinedCondition {
                    owner: task.task_name.clone(),
                    condition_id: condition.condition_id.clone(),
                });
            }
        }

        let mut task = task;
        if task.task_id.is_empty() {
            task.task_id = Uuid::new_v4().to_string();
        }
        let task_id = task.task_id.clone();
        if !registries.tasks.contains_key(&task_id) {
            registries.task_order.push(task_id.clone());
        }
        registries.tasks.insert(task_id.clone(), Arc::new(task));
        Ok(task_id)
    }

    fn add_workflow(&self, workflow: Workflow) -> Result<String, RepositoryError> {
        let mut registries = self.registries.write();
        if workflow.tasks.is_empty() {
            return Err(RepositoryError::EmptyWorkflow {
                workflow_name: workflow.name.clone(),
            });
        }
        for task in &workflow.tasks {
            if !registries.tasks.contains_key(&task.task_id) {
                return Err(RepositoryError::UndefinedTask {
                    workflow_name: workflow.name.clone(),
                    task_id: task.task_id.clone(),
                });
            }
            for condition in &task.conditions {
                if !registries.conditions.contains_key(&condition.condition_id) {
                    return Err(RepositoryError::UndefinedCondition {
                        owner: workflow.name.clone(),
                        condition_id: condition.condition_id.clone(),
                    });
                }
            }
        }

        let mut workflow = workflow;
        if workflow.id.is_empty() {
            workflow.id = Uuid::new_v4().to_string();
        }
        let workflow_id = workflow.id.clone();
        let shared = Arc::new(workflow);
        if !registries.workflows.contains_key(&workflow_id) {
            registries.workflow_order.push(workflow_id.clone());
        }
        registries
            .workflows
            .insert(workflow_id.clone(), Arc::clone(&shared));
        // A new workflow immediately answers the event named after itself.
        if !registries.events.contains_key(&workflow_id) {
            registries.event_order.push(workflow_id.clone());
        }
        registries.events.insert(workflow_id.clone(), vec![shared]);
        Ok(workflow_id)
    }
}
