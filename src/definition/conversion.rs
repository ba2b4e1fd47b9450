use super::document::WorkflowSetDefinition;
use crate::error::DefinitionConversionError;

/// A trait for custom data models that can be converted into a dandori
/// `WorkflowSetDefinition`.
///
/// This is the extension point for making the compiler format-agnostic. By
/// implementing this trait on your own definition structs, you provide a
/// translation layer that lets the compiler process your in-house workflow
/// format without touching the core.
///
/// # Example
///
/// ```rust,no_run
/// use dandori::prelude::*;
/// use dandori::error::DefinitionConversionError;
///
/// // 1. Define your custom structs for parsing your format.
/// struct MyStep { id: String, runner: String }
/// struct MyPipeline { name: String, steps: Vec<MyStep> }
///
/// // 2. Implement `IntoWorkflowSet` for your top-level struct.
/// impl IntoWorkflowSet for MyPipeline {
///     fn into_workflow_set(self) -> std::result::Result<WorkflowSetDefinition, DefinitionConversionError> {
///         let mut root = WorkflowNodeDefinition::new(NodeKind::Sequential);
///         root.id = Some(self.name.clone());
///         root.name = Some(self.name);
///
///         for step in self.steps {
///             // Your logic to convert `MyStep` into a task node.
///             let mut task = WorkflowNodeDefinition::new(NodeKind::Task);
///             task.id = Some(step.id);
///             task.class = Some(step.runner);
///             root.children.push(task);
///         }
///
///         Ok(WorkflowSetDefinition {
///             configurations: vec![],
///             workflows: vec![root],
///         })
///     }
/// }
/// ```
pub trait IntoWorkflowSet {
    /// Consumes the object and converts it into a compiler-ready workflow
    /// set document.
    fn into_workflow_set(self) -> Result<WorkflowSetDefinition, DefinitionConversionError>;
}
