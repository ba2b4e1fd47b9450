//! Common test utilities for building workflow definition documents.
use dandori::prelude::*;

/// A document with one shared condition definition and a sequential
/// pipeline whose second task references it.
///
/// Layout: config group `ingest-defaults`; shared condition
/// `urn:test:MetadataPresent`; sequential `urn:test:IngestPipeline`
/// wrapping `urn:test:CrawlTask` and `urn:test:ArchiveTask`.
#[allow(dead_code)]
pub const INGEST_PIPELINE_JSON: &str = r#"{
    "configurations": [
        {
            "name": "ingest-defaults",
            "properties": [
                { "name": "archive.root", "value": "/data/archive" },
                { "name": "staging.root", "value": "/data/staging" }
            ]
        }
    ],
    "workflows": [
        {
            "kind": "condition",
            "id": "urn:test:MetadataPresent",
            "name": "Metadata Present",
            "class": "metadata-present-condition",
            "timeout": 120
        },
        {
            "kind": "sequential",
            "id": "urn:test:IngestPipeline",
            "name": "Ingest Pipeline",
            "configuration": { "extends": "ingest-defaults" },
            "children": [
                {
                    "kind": "task",
                    "id": "urn:test:CrawlTask",
                    "name": "Crawl",
                    "class": "crawl-task"
                },
                {
                    "kind": "task",
                    "id": "urn:test:ArchiveTask",
                    "name": "Archive",
                    "class": "archive-task",
                    "conditions": [
                        { "kind": "condition", "idRef": "urn:test:MetadataPresent" }
                    ]
                }
            ]
        }
    ]
}"#;

/// A document with a sub-workflow referenced from the middle of a
/// sequential composition, exercising redirector synthesis.
#[allow(dead_code)]
pub const CHAINED_PIPELINES_JSON: &str = r#"{
    "workflows": [
        {
            "kind": "sequential",
            "id": "urn:test:Inner",
            "name": "Inner",
            "children": [
                {
                    "kind": "task",
                    "id": "urn:test:ExtractTask",
                    "name": "Extract",
                    "class": "extract-task"
                }
            ]
        },
        {
            "kind": "sequential",
            "id": "urn:test:Outer",
            "name": "Outer",
            "children": [
                {
                    "kind": "task",
                    "id": "urn:test:FetchTask",
                    "name": "Fetch",
                    "class": "fetch-task"
                },
                {
                    "kind": "workflow",
                    "execution": "sequential",
                    "idRef": "urn:test:Inner"
                },
                {
                    "kind": "task",
                    "id": "urn:test:PublishTask",
                    "name": "Publish",
                    "class": "publish-task"
                }
            ]
        }
    ]
}"#;

/// A document with a parallel composition over a sub-workflow and a bare
/// task, exercising fan-out and wrapper synthesis.
#[allow(dead_code)]
pub const FAN_OUT_JSON: &str = r#"{
    "workflows": [
        {
            "kind": "sequential",
            "id": "urn:test:Branch",
            "name": "Branch",
            "children": [
                {
                    "kind": "task",
                    "id": "urn:test:BranchTask",
                    "name": "Branch Step",
                    "class": "branch-task"
                }
            ]
        },
        {
            "kind": "parallel",
            "id": "urn:test:FanOut",
            "name": "Fan Out",
            "children": [
                {
                    "kind": "workflow",
                    "execution": "sequential",
                    "idRef": "urn:test:Branch"
                },
                {
                    "kind": "task",
                    "id": "urn:test:SoloTask",
                    "name": "Solo",
                    "class": "solo-task"
                }
            ]
        }
    ]
}"#;

/// Parses a single document, panicking on malformed test JSON.
#[allow(dead_code)]
pub fn definition_from_json(json: &str) -> WorkflowSetDefinition {
    WorkflowSetDefinition::from_json(json).expect("Failed to parse definition document")
}

/// Compiles the given documents in order against one shared registry set.
#[allow(dead_code)]
pub fn compile_documents(documents: &[&str]) -> RepositorySnapshot {
    let definitions = documents
        .iter()
        .map(|json| definition_from_json(json))
        .collect();
    Compiler::builder(definitions)
        .build()
        .compile()
        .expect("Failed to compile definition documents")
}

/// Compiles the given documents and materializes the repository.
#[allow(dead_code)]
pub fn repository_from_documents(documents: &[&str]) -> CompiledWorkflowRepository {
    CompiledWorkflowRepository::new(compile_documents(documents))
        .expect("Failed to materialize repository")
}

/// Compiles a single document and returns the compilation error.
#[allow(dead_code)]
pub fn compile_error(json: &str) -> CompilationError {
    let definitions = vec![definition_from_json(json)];
    Compiler::builder(definitions)
        .build()
        .compile()
        .err()
        .expect("Expected compilation to fail")
}
