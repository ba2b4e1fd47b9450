//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the dandori crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! // Use the prelude to get easy access to all the core types.
//! use dandori::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! // Load and compile workflow definition documents
//! let definition = WorkflowSetDefinition::from_file("path/to/workflows.json")?;
//!
//! let snapshot = Compiler::builder(vec![definition]).build().compile()?;
//! let repository = CompiledWorkflowRepository::new(snapshot)?;
//!
//! // Query the compiled registries
//! for workflow in repository.workflows() {
//!     println!("{} -> {} task(s)", workflow.name, workflow.tasks.len());
//! }
//! # Ok(())
//! # }
//! ```

// Core compilation and repository access
pub use crate::compiler::{Compiler, CompilerBuilder};
pub use crate::repository::{CompiledWorkflowRepository, WorkflowRepository};

// Definition documents and snapshots
pub use crate::definition::{
    ConfigurationDefinition, IntoWorkflowSet, NodeKind, PropertyDefinition, RepositorySnapshot,
    WorkflowNodeDefinition, WorkflowSetDefinition,
};

// Compiled entity types
pub use crate::model::{Configuration, Workflow, WorkflowCondition, WorkflowTask};

// Execution plumbing
pub use crate::engine::{ConditionInstance, InstanceRegistry, NoOpTask, TaskInstance};

// Error types
pub use crate::error::{
    CompilationError, DefinitionConversionError, ExecutionError, RepositoryError, SnapshotError,
};

// Standard library re-exports commonly used with this crate
pub use std::path::Path;
pub use std::sync::Arc;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
