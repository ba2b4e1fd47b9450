use serde::{Deserialize, Serialize};

use super::Configuration;

/// A guard evaluated by the execution engine before a task or workflow
/// proceeds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowCondition {
    pub condition_id: String,
    pub condition_name: String,
    /// Opaque implementation handle, resolved by the execution engine.
    pub instance_class: String,
    /// Seconds the engine may wait on the condition; negative means no timeout.
    pub timeout_seconds: i64,
    /// Failure of an optional condition does not block the guarded step.
    pub optional: bool,
    pub config: Configuration,
    pub order: i32,
}

impl WorkflowCondition {
    /// Creates a condition with defaults. An empty display name falls back
    /// to the identifier.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let condition_id = id.into();
        let mut condition_name = name.into();
        if condition_name.is_empty() {
            condition_name = condition_id.clone();
        }
        Self {
            condition_id,
            condition_name,
            instance_class: String::new(),
            timeout_seconds: -1,
            optional: false,
            config: Configuration::new(),
            order: 0,
        }
    }
}
