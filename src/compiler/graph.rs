use uuid::Uuid;

use crate::definition::WorkflowNodeDefinition;

/// Index of a node inside the [`GraphArena`].
pub(super) type GraphId = usize;

/// Fixed order in which a node's children are visited, grouped by their
/// effective execution type.
pub(super) const SCAN_ORDER: [ExecutionType; 4] = [
    ExecutionType::Sequential,
    ExecutionType::Parallel,
    ExecutionType::Condition,
    ExecutionType::Task,
];

/// Execution type of a definition node once the ambiguous `workflow` kind
/// has been resolved through its `execution` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ExecutionType {
    Sequential,
    Parallel,
    Condition,
    Task,
}

impl ExecutionType {
    pub(super) fn parse(name: &str) -> Option<Self> {
        match name {
            "sequential" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            "condition" => Some(Self::Condition),
            "task" => Some(Self::Task),
            _ => None,
        }
    }

    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Condition => "condition",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The registered entity a graph node stands for after resolution. Nodes
/// sharing an `id-ref` carry the same registry identifier, which is what
/// makes reference resolution idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ResolvedEntity {
    None,
    Workflow(String),
    Task(String),
    Condition(String),
}

/// One raw definition entry, addressed by arena index. Parent and children
/// are stored as indices so the tree carries back references without
/// ownership cycles.
#[derive(Debug, Clone)]
pub(super) struct GraphNode {
    pub(super) parent: Option<GraphId>,
    pub(super) children: Vec<GraphId>,
    /// `None` only for the synthetic root of a document tree.
    pub(super) execution_type: Option<ExecutionType>,
    pub(super) model_id: String,
    pub(super) model_id_ref: Option<String>,
    pub(super) model_name: String,
    pub(super) instance_class: String,
    pub(super) timeout: i64,
    pub(super) optional: bool,
    /// Carried through uninterpreted for engines that understand partial
    /// parallel success.
    #[cfg_attr(not(feature = "debug-tools"), allow(dead_code))]
    pub(super) min_required: Option<String>,
    #[cfg_attr(not(feature = "debug-tools"), allow(dead_code))]
    pub(super) excused: Vec<String>,
    pub(super) required_met_fields: Vec<String>,
    pub(super) resolved: ResolvedEntity,
}

impl GraphNode {
    /// Builds a node from a raw definition. The registration identifier is
    /// the alias when present, else the explicit id, else a fresh UUID for
    /// nodes that are not references.
    pub(super) fn from_definition(
        def: &WorkflowNodeDefinition,
        execution_type: ExecutionType,
    ) -> Self {
        let alias = def.alias.as_deref().filter(|a| !a.is_empty());
        let explicit_id = def.id.as_deref().filter(|i| !i.is_empty());
        let id_ref = def.id_ref.as_deref().filter(|r| !r.is_empty());
        let model_id = match (alias, explicit_id) {
            (Some(alias), _) => alias.to_string(),
            (None, Some(id)) => id.to_string(),
            (None, None) if id_ref.is_none() => Uuid::new_v4().to_string(),
            (None, None) => String::new(),
        };

        Self {
            parent: None,
            children: Vec::new(),
            execution_type: Some(execution_type),
            model_id,
            model_id_ref: id_ref.map(str::to_string),
            model_name: def.name.clone().unwrap_or_default(),
            instance_class: def.class.clone().unwrap_or_default(),
            timeout: def.timeout.unwrap_or(-1),
            optional: def.optional.unwrap_or(false),
            min_required: def.min.clone(),
            excused: def
                .excused
                .as_deref()
                .filter(|e| !e.is_empty())
                .map(|e| e.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            required_met_fields: def.required_met_fields.clone(),
            resolved: ResolvedEntity::None,
        }
    }

    fn synthetic_root() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            execution_type: None,
            model_id: String::new(),
            model_id_ref: None,
            model_name: String::new(),
            instance_class: String::new(),
            timeout: -1,
            optional: false,
            min_required: None,
            excused: Vec::new(),
            required_met_fields: Vec::new(),
            resolved: ResolvedEntity::None,
        }
    }
}

/// Arena holding every graph node of a compilation, across all documents.
#[derive(Debug, Default)]
pub(super) struct GraphArena {
    nodes: Vec<GraphNode>,
    roots: Vec<GraphId>,
}

impl GraphArena {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn insert(&mut self, node: GraphNode) -> GraphId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Inserts the synthetic root of one document tree.
    pub(super) fn insert_root(&mut self) -> GraphId {
        let id = self.insert(GraphNode::synthetic_root());
        self.roots.push(id);
        id
    }

    pub(super) fn node(&self, id: GraphId) -> &GraphNode {
        &self.nodes[id]
    }

    pub(super) fn node_mut(&mut self, id: GraphId) -> &mut GraphNode {
        &mut self.nodes[id]
    }

    pub(super) fn link(&mut self, parent: GraphId, child: GraphId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    #[cfg(feature = "debug-tools")]
    pub(super) fn roots(&self) -> &[GraphId] {
        &self.roots
    }

    #[cfg(feature = "debug-tools")]
    pub(super) fn render_tree(&self, root: GraphId) -> String {
        let mut out = String::new();
        self.render_node(root, 0, &mut out);
        out
    }

    #[cfg(feature = "debug-tools")]
    fn render_node(&self, id: GraphId, depth: usize, out: &mut String) {
        let node = &self.nodes[id];
        out.push_str(&"  ".repeat(depth));
        out.push_str(node.execution_type.map_or("root", ExecutionType::as_str));
        if !node.model_id.is_empty() {
            out.push_str(&format!(" id={}", node.model_id));
        }
        if let Some(id_ref) = &node.model_id_ref {
            out.push_str(&format!(" id-ref={id_ref}"));
        }
        if let Some(min) = &node.min_required {
            out.push_str(&format!(" min={min}"));
        }
        if !node.excused.is_empty() {
            out.push_str(&format!(" excused={}", node.excused.join(",")));
        }
        match &node.resolved {
            ResolvedEntity::None => {}
            ResolvedEntity::Workflow(id) => out.push_str(&format!(" -> workflow [{id}]")),
            ResolvedEntity::Task(id) => out.push_str(&format!(" -> task [{id}]")),
            ResolvedEntity::Condition(id) => out.push_str(&format!(" -> condition [{id}]")),
        }
        out.push('\n');
        for &child in &node.children {
            self.render_node(child, depth + 1, out);
        }
    }
}
