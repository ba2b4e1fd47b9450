//! # Dandori - Workflow Definition Compiler and Repository
//!
//! **Dandori** is a workflow definition compiler that transforms declarative,
//! packaged workflow documents into fast, queryable in-memory registries.
//! Definitions are compiled ahead of time through an intermediate graph
//! representation, so an execution engine never touches raw documents at
//! runtime.
//!
//! ## Core Workflow
//!
//! The compiler is designed to be format-agnostic. It operates on a canonical
//! internal model of a "workflow set definition." The primary workflow is:
//!
//! 1.  **Load Your Documents**: Parse workflow-set documents from JSON files, or parse your own custom format into your own Rust structs.
//! 2.  **Convert to Dandori's Model**: For custom formats, implement the `IntoWorkflowSet` trait on your structs to provide a translation layer into Dandori's `WorkflowSetDefinition`.
//! 3.  **Compile**: Use `Compiler::builder` to create a compiler instance over the definition documents. The compiler expands composition trees, resolves shared references, flattens nested compositions into dispatchable task lists, and emits a `RepositorySnapshot`.
//! 4.  **Query**: Materialize a `CompiledWorkflowRepository` from the snapshot and serve lookups by workflow, task, condition, or triggering event to any number of threads.
//!
//! ## Quick Start
//!
//! The following example demonstrates the end-to-end process.
//!
//! ```rust,no_run
//! use dandori::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     // 1. A workflow-set document, usually loaded from a file with
//!     //    `WorkflowSetDefinition::from_file`.
//!     let document = r#"{
//!         "configurations": [
//!             {
//!                 "name": "ingest-defaults",
//!                 "properties": [
//!                     { "name": "archive.root", "value": "/data/archive" }
//!                 ]
//!             }
//!         ],
//!         "workflows": [
//!             {
//!                 "kind": "sequential",
//!                 "id": "urn:example:IngestPipeline",
//!                 "name": "Ingest Pipeline",
//!                 "configuration": { "extends": "ingest-defaults" },
//!                 "children": [
//!                     {
//!                         "kind": "task",
//!                         "id": "urn:example:CrawlTask",
//!                         "name": "Crawl",
//!                         "class": "crawl-task"
//!                     },
//!                     {
//!                         "kind": "task",
//!                         "id": "urn:example:ArchiveTask",
//!                         "name": "Archive",
//!                         "class": "archive-task"
//!                     }
//!                 ]
//!             }
//!         ]
//!     }"#;
//!
//!     let definition = WorkflowSetDefinition::from_json(document)?;
//!
//!     // 2. Compile the documents into a repository snapshot.
//!     println!("Compiling workflow definitions...");
//!     let snapshot = Compiler::builder(vec![definition]).build().compile()?;
//!     println!("Compilation successful!");
//!
//!     // 3. Materialize the queryable repository.
//!     let repository = CompiledWorkflowRepository::new(snapshot)?;
//!
//!     // 4. Query the registries.
//!     for workflow in repository.workflows() {
//!         println!("-> Workflow: {} ({})", workflow.name, workflow.id);
//!         for task in &workflow.tasks {
//!             println!("   task: {} [{}]", task.task_name, task.instance_class);
//!         }
//!     }
//!
//!     for event in repository.registered_events() {
//!         let triggered = repository.workflows_for_event(&event);
//!         println!("-> Event {} triggers {} workflow(s)", event, triggered.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod definition;
pub mod engine;
pub mod error;
pub mod model;
pub mod prelude;
pub mod repository;

#[cfg(feature = "python-bindings")]
mod python;
