use serde::Deserialize;
use serde_json::Value;
use std::fs;

use crate::error::CompilationError;

/// One loaded workflow-set document: the canonical input format of the
/// compiler. A document carries named shared configuration groups and a list
/// of top-level nodes, which may be workflow trees or standalone shared
/// task/condition definitions referenced from elsewhere via `idRef`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct WorkflowSetDefinition {
    /// Named configuration groups other blocks may extend.
    #[serde(default)]
    pub configurations: Vec<ConfigurationDefinition>,
    /// Top-level nodes: workflow trees plus shared definitions.
    #[serde(default)]
    pub workflows: Vec<WorkflowNodeDefinition>,
}

impl WorkflowSetDefinition {
    /// Parses a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CompilationError> {
        serde_json::from_str(json).map_err(|e| CompilationError::JsonParseError(e.to_string()))
    }

    /// Reads and parses a document from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, CompilationError> {
        let content =
            fs::read_to_string(path).map_err(|e| CompilationError::DefinitionReadError {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Self::from_json(&content)
    }
}

/// The tag of a definition node.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Sequential,
    Parallel,
    Condition,
    Task,
    /// Ambiguous wrapper kind; its `execution` attribute names the
    /// composition type.
    Workflow,
}

/// One node of a definition tree, before compilation.
#[derive(Deserialize, Debug, Clone)]
pub struct WorkflowNodeDefinition {
    pub kind: NodeKind,
    #[serde(default)]
    pub id: Option<String>,
    /// Reference to an already-defined shared workflow/task/condition.
    #[serde(default, alias = "idRef", alias = "id-ref")]
    pub id_ref: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// When present, replaces the identifier the node registers under.
    #[serde(default)]
    pub alias: Option<String>,
    /// Opaque implementation handle for task/condition nodes.
    #[serde(default)]
    pub class: Option<String>,
    /// Composition type for the ambiguous `workflow` kind.
    #[serde(default)]
    pub execution: Option<String>,
    /// Seconds; negative means no timeout.
    #[serde(default)]
    pub timeout: Option<i64>,
    #[serde(default)]
    pub optional: Option<bool>,
    /// Minimum successful sub-processors, uninterpreted by the compiler.
    #[serde(default)]
    pub min: Option<String>,
    /// Comma-separated identifiers of sub-processors excused from failure.
    #[serde(default)]
    pub excused: Option<String>,
    /// Metadata keys that must be present before a task node can run.
    #[serde(default, alias = "requiredMetFields")]
    pub required_met_fields: Vec<String>,
    #[serde(default)]
    pub configuration: Option<ConfigurationDefinition>,
    /// Linking block, scanned only when the node has no inline condition
    /// children. At document root it defines shared conditions.
    #[serde(default)]
    pub conditions: Vec<WorkflowNodeDefinition>,
    #[serde(default)]
    pub children: Vec<WorkflowNodeDefinition>,
    /// Unmatched keys. Those prefixed `p:` are static parameters folded
    /// into the metadata context; the rest are ignored.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl WorkflowNodeDefinition {
    /// Creates an empty node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            id_ref: None,
            name: None,
            alias: None,
            class: None,
            execution: None,
            timeout: None,
            optional: None,
            min: None,
            excused: None,
            required_met_fields: Vec::new(),
            configuration: None,
            conditions: Vec::new(),
            children: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Static parameters carried on the node: `p:`-prefixed keys with their
    /// values rendered as strings.
    pub fn static_params(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.extra.iter().filter_map(|(key, value)| {
            key.strip_prefix("p:").map(|name| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name, rendered)
            })
        })
    }
}

/// A configuration block: local properties plus optional inheritance from
/// previously registered named groups.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ConfigurationDefinition {
    /// Registration name; an unnamed block registers under the enclosing
    /// node's identifier.
    #[serde(default)]
    pub name: Option<String>,
    /// Comma-separated group names merged in listed order before the local
    /// properties are applied.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

/// One key/value property of a configuration block.
#[derive(Deserialize, Debug, Clone)]
pub struct PropertyDefinition {
    pub name: String,
    pub value: String,
    /// When set, `[VAR]` segments in the value are replaced from the
    /// process environment at compile time.
    #[serde(default, alias = "envReplace")]
    pub env_replace: bool,
}
