use thiserror::Error;

/// Errors that can occur while compiling workflow definition documents.
#[derive(Error, Debug, Clone)]
pub enum CompilationError {
    #[error("Failed to parse workflow definition JSON: {0}")]
    JsonParseError(String),

    #[error("Failed to read workflow definition source '{path}': {message}")]
    DefinitionReadError { path: String, message: String },

    #[error("Node '{node_id}' has an unsupported execution type: '{type_name}'")]
    UnsupportedExecutionType { node_id: String, type_name: String },

    #[error("Composition node '{node_id}' does not declare an execution type")]
    MissingExecutionType { node_id: String },

    #[error("Configuration group '{group}' is not defined in any loaded definition")]
    ConfigGroupNotFound { group: String },

    #[error("Configuration group '{group}' extends itself through a cycle")]
    ConfigGroupCycle { group: String },

    #[error("Node '{node_id}' references an unregistered {kind} via id-ref '{id_ref}'")]
    UnresolvedReference {
        node_id: String,
        kind: String,
        id_ref: String,
    },
}

/// Errors returned by repository mutations and the stricter lookup paths.
#[derive(Error, Debug, Clone)]
pub enum RepositoryError {
    #[error("Attempt to define workflow '{workflow_name}' with no tasks")]
    EmptyWorkflow { workflow_name: String },

    #[error("Workflow '{workflow_name}' references an undefined task with id '{task_id}'")]
    UndefinedTask {
        workflow_name: String,
        task_id: String,
    },

    #[error("'{owner}' references an undefined condition with id '{condition_id}'")]
    UndefinedCondition { owner: String, condition_id: String },

    #[error("Workflow '{workflow_id}' does not exist")]
    WorkflowNotFound { workflow_id: String },
}

/// Errors that can occur when converting a custom user format into a `WorkflowSetDefinition`.
#[derive(Error, Debug, Clone)]
pub enum DefinitionConversionError {
    #[error("Invalid workflow definition data: {0}")]
    ValidationError(String),
}

/// Errors that can occur while saving or loading a compiled repository snapshot.
#[derive(Error, Debug, Clone)]
pub enum SnapshotError {
    #[error("Snapshot serialization failed: {0}")]
    EncodeError(String),

    #[error("Snapshot deserialization failed: {0}")]
    DecodeError(String),

    #[error("Could not access snapshot file '{path}': {message}")]
    FileError { path: String, message: String },
}

/// Errors raised by task instances run through the engine-side contract.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("Task instance failed: {0}")]
    TaskFailed(String),
}
