use crate::definition::{
    ConfigurationGroupRecord, EventRecord, RepositorySnapshot, TaskRecord, WorkflowRecord,
    WorkflowSetDefinition,
};
use crate::error::CompilationError;
use crate::model::{Configuration, WorkflowCondition};
use ahash::AHashMap;

#[cfg(feature = "debug-tools")]
use {itertools::Itertools, std::fs};

mod builder;
mod events;
mod graph;

use builder::GraphBuilder;
use events::EventFlattener;
use graph::{GraphArena, GraphId};

/// Mutable registries threaded through the build and flattening passes.
/// Entities live as id-indexed records; the `_order` vectors preserve
/// first-registration order so passes and snapshots are deterministic.
#[derive(Default)]
struct CompileState {
    conditions: AHashMap<String, WorkflowCondition>,
    condition_order: Vec<String>,
    tasks: AHashMap<String, TaskRecord>,
    task_order: Vec<String>,
    workflows: AHashMap<String, WorkflowRecord>,
    workflow_order: Vec<String>,
    workflow_graphs: AHashMap<String, GraphId>,
    detached_workflows: Vec<WorkflowRecord>,
    events: AHashMap<String, Vec<String>>,
    event_order: Vec<String>,
    conf_groups: AHashMap<String, Configuration>,
    conf_group_order: Vec<String>,
}

impl CompileState {
    fn register_condition(&mut self, condition: WorkflowCondition) {
        let id = condition.condition_id.clone();
        if !self.conditions.contains_key(&id) {
            self.condition_order.push(id.clone());
        }
        self.conditions.insert(id, condition);
    }

    fn register_task(&mut self, task: TaskRecord) {
        let id = task.task_id.clone();
        if !self.tasks.contains_key(&id) {
            self.task_order.push(id.clone());
        }
        self.tasks.insert(id, task);
    }

    fn register_workflow(&mut self, workflow: WorkflowRecord) {
        let id = workflow.id.clone();
        if !self.workflows.contains_key(&id) {
            self.workflow_order.push(id.clone());
        }
        self.workflows.insert(id, workflow);
    }

    fn register_event(&mut self, event: String, workflow_ids: Vec<String>) {
        if !self.events.contains_key(&event) {
            self.event_order.push(event.clone());
        }
        self.events.insert(event, workflow_ids);
    }

    fn register_conf_group(&mut self, name: &str, configuration: Configuration) {
        if !self.conf_groups.contains_key(name) {
            self.conf_group_order.push(name.to_string());
        }
        self.conf_groups.insert(name.to_string(), configuration);
    }

    fn into_snapshot(mut self) -> RepositorySnapshot {
        let mut conditions = Vec::with_capacity(self.condition_order.len());
        for id in &self.condition_order {
            if let Some(condition) = self.conditions.remove(id) {
                conditions.push(condition);
            }
        }

        let mut tasks = Vec::with_capacity(self.task_order.len());
        for id in &self.task_order {
            if let Some(task) = self.tasks.remove(id) {
                tasks.push(task);
            }
        }

        // Parallel composites removed during flattening are absent from the
        // map; their order entries are simply skipped here.
        let mut workflows = Vec::with_capacity(self.workflow_order.len());
        for id in &self.workflow_order {
            if let Some(workflow) = self.workflows.remove(id) {
                workflows.push(workflow);
            }
        }

        let mut events = Vec::with_capacity(self.event_order.len());
        for event in &self.event_order {
            if let Some(workflow_ids) = self.events.remove(event) {
                events.push(EventRecord {
                    event: event.clone(),
                    workflow_ids,
                });
            }
        }

        let mut configuration_groups = Vec::with_capacity(self.conf_group_order.len());
        for name in &self.conf_group_order {
            if let Some(configuration) = self.conf_groups.remove(name) {
                configuration_groups.push(ConfigurationGroupRecord {
                    name: name.clone(),
                    configuration,
                });
            }
        }

        RepositorySnapshot {
            conditions,
            tasks,
            workflows,
            detached_workflows: self.detached_workflows,
            events,
            configuration_groups,
        }
    }
}

pub struct Compiler {
    definitions: Vec<WorkflowSetDefinition>,
    deep_extends: bool,
    arena: GraphArena,
    state: CompileState,
}

pub struct CompilerBuilder {
    definitions: Vec<WorkflowSetDefinition>,
    deep_extends: bool,
}

impl CompilerBuilder {
    pub fn new(definitions: Vec<WorkflowSetDefinition>) -> Self {
        Self {
            definitions,
            deep_extends: false,
        }
    }

    pub fn with_definition(mut self, definition: WorkflowSetDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Resolves forward-scanned `extends` chains transitively instead of
    /// taking only the named group's local properties. Off by default for
    /// compatibility with the historical single-level behavior.
    pub fn with_deep_extends(mut self, deep_extends: bool) -> Self {
        self.deep_extends = deep_extends;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            definitions: self.definitions,
            deep_extends: self.deep_extends,
            arena: GraphArena::new(),
            state: CompileState::default(),
        }
    }
}

impl Compiler {
    pub fn builder(definitions: Vec<WorkflowSetDefinition>) -> CompilerBuilder {
        CompilerBuilder::new(definitions)
    }

    /// Compiles all loaded definition documents into a repository snapshot:
    /// graph construction and entity resolution first, then the event
    /// flattening and workflow-condition passes.
    pub fn compile(mut self) -> Result<RepositorySnapshot, CompilationError> {
        {
            let mut builder = GraphBuilder::new(
                &self.definitions,
                self.deep_extends,
                &mut self.arena,
                &mut self.state,
            );
            builder.build()?;
        }
        {
            let mut flattener = EventFlattener::new(&self.arena, &mut self.state);
            flattener.compute_events()?;
            flattener.attach_condition_evaluators();
        }

        #[cfg(feature = "debug-tools")]
        self.write_debug_dumps();

        Ok(self.state.into_snapshot())
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_dumps(&self) {
        if let Err(e) = fs::create_dir_all("tmp") {
            eprintln!("Warning: could not create debug directory: {}", e);
            return;
        }
        for (index, &root) in self.arena.roots().iter().enumerate() {
            let rendered = self.arena.render_tree(root);
            if let Err(e) = fs::write(format!("tmp/workflow_graph_{}.txt", index), rendered) {
                eprintln!("Warning: could not write debug graph dump: {}", e);
            }
        }
        let events = self
            .state
            .event_order
            .iter()
            .filter_map(|event| {
                self.state
                    .events
                    .get(event)
                    .map(|ids| format!("{} -> [{}]", event, ids.iter().join(", ")))
            })
            .join("\n");
        if let Err(e) = fs::write("tmp/event_map.txt", events) {
            eprintln!("Warning: could not write debug event dump: {}", e);
        }
    }
}
