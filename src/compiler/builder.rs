use crate::compiler::CompileState;
use crate::compiler::graph::{
    ExecutionType, GraphArena, GraphId, GraphNode, ResolvedEntity, SCAN_ORDER,
};
use crate::definition::{
    ConfigurationDefinition, NodeKind, TaskRecord, WorkflowNodeDefinition, WorkflowRecord,
    WorkflowSetDefinition,
};
use crate::error::CompilationError;
use crate::model::{Configuration, WorkflowCondition, replace_env_variables};

/// Responsible for walking the raw definition trees, building the graph
/// arena and registering every resolved entity in the compile state.
pub(super) struct GraphBuilder<'a> {
    documents: &'a [WorkflowSetDefinition],
    deep_extends: bool,
    arena: &'a mut GraphArena,
    state: &'a mut CompileState,
}

impl<'a> GraphBuilder<'a> {
    pub(super) fn new(
        documents: &'a [WorkflowSetDefinition],
        deep_extends: bool,
        arena: &'a mut GraphArena,
        state: &'a mut CompileState,
    ) -> Self {
        Self {
            documents,
            deep_extends,
            arena,
            state,
        }
    }

    /// Compiles every document against the shared registries. Per document:
    /// shared configuration groups first, then standalone condition and task
    /// definitions, then the workflow trees, so a tree may reference a
    /// definition regardless of where in the document it appears.
    pub(super) fn build(&mut self) -> Result<(), CompilationError> {
        // Copy the shared slice out so the iteration does not hold a borrow
        // of `self` across the mutable compile calls.
        let documents = self.documents;
        for document in documents {
            let mut context = Configuration::new();
            let root = self.arena.insert_root();

            for block in &document.configurations {
                self.load_configuration_block(None, block, &mut context)?;
            }

            let kinds: Vec<ExecutionType> = document
                .workflows
                .iter()
                .map(|def| self.effective_type(def))
                .collect::<Result<_, _>>()?;

            for pass in [
                ExecutionType::Condition,
                ExecutionType::Task,
                ExecutionType::Sequential,
                ExecutionType::Parallel,
            ] {
                for (def, kind) in document.workflows.iter().zip(&kinds) {
                    if *kind == pass {
                        self.compile_node(def, root, &mut context)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Recursively compiles one definition node: configuration first, then
    /// the graph node itself, then its resolution, then the children in the
    /// fixed scan order.
    fn compile_node(
        &mut self,
        def: &WorkflowNodeDefinition,
        parent: GraphId,
        context: &mut Configuration,
    ) -> Result<GraphId, CompilationError> {
        let execution_type = self.effective_type(def)?;

        if let Some(block) = &def.configuration {
            self.load_configuration_block(def.id.as_deref(), block, context)?;
        }
        for (key, value) in def.static_params() {
            context.replace(key, vec![value]);
        }

        let gid = self
            .arena
            .insert(GraphNode::from_definition(def, execution_type));
        self.arena.link(parent, gid);
        self.resolve_node(gid, def, execution_type, context)?;

        let kinds: Vec<ExecutionType> = def
            .children
            .iter()
            .map(|child| self.effective_type(child))
            .collect::<Result<_, _>>()?;
        let mut compiled: Vec<(usize, GraphId)> = Vec::with_capacity(def.children.len());
        for pass in SCAN_ORDER {
            for (position, (child, kind)) in def.children.iter().zip(&kinds).enumerate() {
                if *kind == pass {
                    compiled.push((position, self.compile_node(child, gid, context)?));
                }
            }
        }

        // Compilation visits the children grouped by kind, which decides
        // registration order; the stored child list keeps the declared order
        // so the flattening pass preserves it.
        compiled.sort_by_key(|(position, _)| *position);
        let mut ordered: Vec<GraphId> = compiled.into_iter().map(|(_, child)| child).collect();

        // The linking block is only honored when the node carries no inline
        // condition children.
        if !kinds.contains(&ExecutionType::Condition) {
            for linked in &def.conditions {
                ordered.push(self.compile_node(linked, gid, context)?);
            }
        }
        self.arena.node_mut(gid).children = ordered;

        Ok(gid)
    }

    fn resolve_node(
        &mut self,
        gid: GraphId,
        def: &WorkflowNodeDefinition,
        execution_type: ExecutionType,
        context: &Configuration,
    ) -> Result<(), CompilationError> {
        match execution_type {
            ExecutionType::Sequential | ExecutionType::Parallel => {
                self.resolve_workflow(gid, def, execution_type)
            }
            ExecutionType::Condition => self.resolve_condition(gid, def, context),
            ExecutionType::Task => self.resolve_task(gid, def, context),
        }
    }

    /// A composition node either reuses the referenced workflow or creates
    /// and registers a new one. Workflows are never attached to a parent
    /// entity; the flattening pass turns sub-workflow children into
    /// redirector tasks instead.
    fn resolve_workflow(
        &mut self,
        gid: GraphId,
        def: &WorkflowNodeDefinition,
        execution_type: ExecutionType,
    ) -> Result<(), CompilationError> {
        if let Some(id_ref) = &self.arena.node(gid).model_id_ref {
            let id_ref = id_ref.clone();
            if !self.state.workflows.contains_key(&id_ref) {
                return Err(CompilationError::UnresolvedReference {
                    node_id: node_label(def),
                    kind: "workflow".to_string(),
                    id_ref,
                });
            }
            self.arena.node_mut(gid).resolved = ResolvedEntity::Workflow(id_ref);
            return Ok(());
        }

        let node = self.arena.node(gid);
        let name = if node.model_name.is_empty() {
            format!("{}-{}", execution_type, node.model_id)
        } else {
            node.model_name.clone()
        };
        let record = WorkflowRecord {
            id: node.model_id.clone(),
            name,
            task_ids: Vec::new(),
            condition_ids: Vec::new(),
        };
        let id = record.id.clone();
        self.state.register_workflow(record);
        self.state.workflow_graphs.insert(id.clone(), gid);
        self.arena.node_mut(gid).resolved = ResolvedEntity::Workflow(id);
        Ok(())
    }

    fn resolve_condition(
        &mut self,
        gid: GraphId,
        def: &WorkflowNodeDefinition,
        context: &Configuration,
    ) -> Result<(), CompilationError> {
        if let Some(id_ref) = &self.arena.node(gid).model_id_ref {
            let id_ref = id_ref.clone();
            if !self.state.conditions.contains_key(&id_ref) {
                return Err(CompilationError::UnresolvedReference {
                    node_id: node_label(def),
                    kind: "condition".to_string(),
                    id_ref,
                });
            }
            self.arena.node_mut(gid).resolved = ResolvedEntity::Condition(id_ref.clone());
            self.attach_condition(gid, id_ref);
            return Ok(());
        }

        let node = self.arena.node(gid);
        let mut condition = WorkflowCondition::new(&node.model_id, &node.model_name);
        condition.instance_class = node.instance_class.clone();
        condition.timeout_seconds = node.timeout;
        condition.optional = node.optional;
        condition.order = self.creation_order(gid);
        // Entities bind a snapshot of the threaded context at resolution
        // time; later context mutations do not leak back.
        condition.config = context.clone();

        let id = condition.condition_id.clone();
        self.state.register_condition(condition);
        self.arena.node_mut(gid).resolved = ResolvedEntity::Condition(id.clone());
        self.attach_condition(gid, id);
        Ok(())
    }

    fn resolve_task(
        &mut self,
        gid: GraphId,
        def: &WorkflowNodeDefinition,
        context: &Configuration,
    ) -> Result<(), CompilationError> {
        if let Some(id_ref) = &self.arena.node(gid).model_id_ref {
            let id_ref = id_ref.clone();
            if !self.state.tasks.contains_key(&id_ref) {
                return Err(CompilationError::UnresolvedReference {
                    node_id: node_label(def),
                    kind: "task".to_string(),
                    id_ref,
                });
            }
            self.arena.node_mut(gid).resolved = ResolvedEntity::Task(id_ref.clone());
            self.attach_task(gid, id_ref);
            return Ok(());
        }

        let node = self.arena.node(gid);
        let task_name = if node.model_name.is_empty() {
            node.model_id.clone()
        } else {
            node.model_name.clone()
        };
        let record = TaskRecord {
            task_id: node.model_id.clone(),
            task_name,
            instance_class: node.instance_class.clone(),
            condition_ids: Vec::new(),
            config: context.clone(),
            required_met_fields: node.required_met_fields.clone(),
            order: self.creation_order(gid),
        };
        let id = record.task_id.clone();
        self.state.register_task(record);
        self.arena.node_mut(gid).resolved = ResolvedEntity::Task(id.clone());
        self.attach_task(gid, id);
        Ok(())
    }

    /// Appends a resolved condition to the entity of the node's immediate
    /// parent: a workflow's condition list or a task's precondition list. A
    /// condition under neither is a standalone shared definition.
    fn attach_condition(&mut self, gid: GraphId, condition_id: String) {
        let Some(parent) = self.arena.node(gid).parent else {
            return;
        };
        match self.arena.node(parent).resolved.clone() {
            ResolvedEntity::Workflow(workflow_id) => {
                if let Some(workflow) = self.state.workflows.get_mut(&workflow_id) {
                    workflow.condition_ids.push(condition_id);
                }
            }
            ResolvedEntity::Task(task_id) => {
                if let Some(task) = self.state.tasks.get_mut(&task_id) {
                    task.condition_ids.push(condition_id);
                }
            }
            _ => {}
        }
    }

    /// Appends a resolved task to the immediate parent workflow's task
    /// list, preserving declaration order. A task under no workflow is a
    /// standalone shared definition.
    fn attach_task(&mut self, gid: GraphId, task_id: String) {
        let Some(parent) = self.arena.node(gid).parent else {
            return;
        };
        if let ResolvedEntity::Workflow(workflow_id) = self.arena.node(parent).resolved.clone() {
            if let Some(workflow) = self.state.workflows.get_mut(&workflow_id) {
                workflow.task_ids.push(task_id);
            }
        }
    }

    /// 1-based position among the parent's children for nested entities,
    /// 0 for standalone definitions hanging off a document root.
    fn creation_order(&self, gid: GraphId) -> i32 {
        match self.arena.node(gid).parent {
            Some(parent) if self.arena.node(parent).execution_type.is_some() => {
                self.arena.node(parent).children.len() as i32
            }
            _ => 0,
        }
    }

    /// Resolves the effective execution type of a definition node. The
    /// ambiguous `workflow` kind must name one of the four supported types
    /// in its `execution` attribute.
    fn effective_type(
        &self,
        def: &WorkflowNodeDefinition,
    ) -> Result<ExecutionType, CompilationError> {
        match def.kind {
            NodeKind::Sequential => Ok(ExecutionType::Sequential),
            NodeKind::Parallel => Ok(ExecutionType::Parallel),
            NodeKind::Condition => Ok(ExecutionType::Condition),
            NodeKind::Task => Ok(ExecutionType::Task),
            NodeKind::Workflow => {
                let execution = def
                    .execution
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| CompilationError::MissingExecutionType {
                        node_id: node_label(def),
                    })?;
                ExecutionType::parse(execution).ok_or_else(|| {
                    CompilationError::UnsupportedExecutionType {
                        node_id: node_label(def),
                        type_name: execution.to_string(),
                    }
                })
            }
        }
    }

    /// Merges one configuration block: extended groups in listed order, then
    /// the local properties. The merged result is registered under the block
    /// name (or the enclosing node's id) and folded into the threaded
    /// context.
    fn load_configuration_block(
        &mut self,
        owner_id: Option<&str>,
        block: &ConfigurationDefinition,
        context: &mut Configuration,
    ) -> Result<(), CompilationError> {
        let mut merged = Configuration::new();
        if let Some(extends) = block.extends.as_deref().filter(|e| !e.is_empty()) {
            for group in extends.split(',') {
                let resolved = match self.state.conf_groups.get(group) {
                    Some(registered) => registered.clone(),
                    None => self.scan_for_group(group, &mut Vec::new())?,
                };
                merged.merge(&resolved);
            }
        }
        merged.merge(&local_properties(block));

        let register_key = block
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| owner_id.filter(|o| !o.is_empty()));
        if let Some(key) = register_key {
            self.state.register_conf_group(key, merged.clone());
        }
        context.merge(&merged);
        Ok(())
    }

    /// Forward scan over every loaded document for a configuration block
    /// with the given name. In the default shallow mode only that block's
    /// local properties are returned, matching the historical single-level
    /// inheritance; deep mode resolves the block's own `extends` chain and
    /// rejects cycles.
    fn scan_for_group(
        &self,
        group: &str,
        seen: &mut Vec<String>,
    ) -> Result<Configuration, CompilationError> {
        if seen.iter().any(|s| s == group) {
            return Err(CompilationError::ConfigGroupCycle {
                group: group.to_string(),
            });
        }
        let block =
            self.find_group_block(group)
                .ok_or_else(|| CompilationError::ConfigGroupNotFound {
                    group: group.to_string(),
                })?;

        if !self.deep_extends {
            return Ok(local_properties(block));
        }

        seen.push(group.to_string());
        let mut merged = Configuration::new();
        if let Some(extends) = block.extends.as_deref().filter(|e| !e.is_empty()) {
            for parent in extends.split(',') {
                let resolved = match self.state.conf_groups.get(parent) {
                    Some(registered) => registered.clone(),
                    None => self.scan_for_group(parent, seen)?,
                };
                merged.merge(&resolved);
            }
        }
        merged.merge(&local_properties(block));
        seen.pop();
        Ok(merged)
    }

    fn find_group_block(&self, group: &str) -> Option<&'a ConfigurationDefinition> {
        for document in self.documents {
            for block in &document.configurations {
                if block.name.as_deref() == Some(group) {
                    return Some(block);
                }
            }
            for node in &document.workflows {
                if let Some(found) = find_group_in_node(node, group) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// Depth-first search through a definition tree for a named configuration
/// block, covering nested children and linked condition entries.
fn find_group_in_node<'d>(
    node: &'d WorkflowNodeDefinition,
    group: &str,
) -> Option<&'d ConfigurationDefinition> {
    if let Some(block) = &node.configuration {
        if block.name.as_deref() == Some(group) {
            return Some(block);
        }
    }
    for child in &node.children {
        if let Some(found) = find_group_in_node(child, group) {
            return Some(found);
        }
    }
    for linked in &node.conditions {
        if let Some(found) = find_group_in_node(linked, group) {
            return Some(found);
        }
    }
    None
}

/// The block's own properties as a configuration, with `[VAR]` environment
/// segments substituted where requested.
fn local_properties(block: &ConfigurationDefinition) -> Configuration {
    let mut configuration = Configuration::new();
    for property in &block.properties {
        let value = if property.env_replace {
            replace_env_variables(&property.value)
        } else {
            property.value.clone()
        };
        configuration.replace(&property.name, vec![value]);
    }
    configuration
}

fn node_label(def: &WorkflowNodeDefinition) -> String {
    def.id
        .as_deref()
        .or(def.id_ref.as_deref())
        .or(def.alias.as_deref())
        .unwrap_or("N/A")
        .to_string()
}
